use cascada_lib::{CascadeOptions, StyledDocument, Viewport};
use clap::Parser;
use log::info;
use std::fs;

const CASCADA_INTRO: &str = r#"
      ______                          __
     / ____/___ _______________ _____/ /___ _
    / /   / __ `/ ___/ ___/ __ `/ __  / __ `/
   / /___/ /_/ (__  ) /__/ /_/ / /_/ / /_/ /
   \____/\__,_/____/\___/\__,_/\__,_/\__,_/

    Cascada - computed styles for HTML, in Rust.
"#;

#[derive(Parser)]
#[command(name = "Cascada")]
#[command(about = "Apply CSS to an HTML document and print the computed styles")]
struct Args {
    /// Input HTML file.
    input: String,

    /// Extra stylesheet, applied after the document's own <style> elements.
    #[arg(long = "css")]
    css: Vec<String>,

    /// Viewport width in px.
    #[arg(long, default_value_t = 100.0)]
    width: f64,

    /// Viewport height in px.
    #[arg(long, default_value_t = 100.0)]
    height: f64,

    /// Skip blocks whose @media conditions fail for the viewport.
    #[arg(long)]
    evaluate_media: bool,

    /// Only print the computed style of elements matching this selector.
    #[arg(long)]
    select: Option<String>,
}

fn main() {
    env_logger::init();
    println!("{}", CASCADA_INTRO);

    let args: Args = Args::parse();
    let options = CascadeOptions::default()
        .with_viewport(Viewport::new(args.width, args.height))
        .with_media_evaluation(args.evaluate_media);

    let html_content = read_or_exit(&args.input, "HTML");
    let mut styled = StyledDocument::with_options(&html_content, options);

    if let Err(e) = styled.apply_inline_styles() {
        eprintln!("Error in <style> element: {}", e);
        std::process::exit(1);
    }
    for path in &args.css {
        let css_content = read_or_exit(path, "CSS");
        if let Err(e) = styled.apply_css(&css_content) {
            eprintln!("Error in {}: {}", path, e);
            std::process::exit(1);
        }
        info!("applied {}", path);
    }
    styled.evaluate_properties();

    match &args.select {
        Some(selector) => print_selection(&styled, selector),
        None => styled.print_styled_tree(),
    }
}

fn read_or_exit(path: &str, kind: &str) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {} file {}: {}", kind, path, e);
            std::process::exit(1);
        }
    }
}

fn print_selection(styled: &StyledDocument, selector: &str) {
    let document = styled.document();
    for id in document.query_selector_all(selector) {
        let tag = document.element(id).map(|e| e.tag.as_str()).unwrap_or_default();
        println!("<{}> #{}", tag, id.0);
        match document.style(id) {
            Some(style) => {
                for (property, value) in style.iter() {
                    println!("  {}: {}", property, value);
                }
            }
            None => println!("  (unstyled)"),
        }
    }
}

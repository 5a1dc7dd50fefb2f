pub mod html_sink;

pub use html_sink::{create_dom_tree, CascadaTreeSink};

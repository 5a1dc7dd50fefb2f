//! Unit resolution: relative lengths → absolute `px`.

use crate::config::Viewport;

/// Root font size in px; `em`, `rem` and the absolute-size keywords scale it.
pub const ROOT_FONT_SIZE: f64 = 16.0;

/// Absolute-size keywords as multiples of [`ROOT_FONT_SIZE`].
pub const ABSOLUTE_SIZES: &[(&str, f64)] = &[
    ("xx-small", 3.0 / 5.0),
    ("x-small", 3.0 / 4.0),
    ("small", 8.0 / 9.0),
    ("medium", 1.0),
    ("large", 6.0 / 5.0),
    ("x-large", 3.0 / 2.0),
    ("xx-large", 2.0),
    ("xxx-large", 3.0),
];

/// Inputs the unit pass needs besides the value itself.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
    pub property: &'a str,
    pub viewport: Viewport,
    /// The parent's resolved value for the same property.
    pub parent_value: Option<&'a str>,
}

/// Rewrites every unit token of `value` independently.
pub fn resolve_units(value: &str, ctx: &UnitContext<'_>) -> String {
    let value = if matches!(ctx.property, "font-size" | "font") {
        replace_size_keywords(value)
    } else {
        value.to_string()
    };
    let parent_px = ctx.parent_value.and_then(parse_px);

    rewrite_numbers(&value, |number, unit| match unit.to_ascii_lowercase().as_str() {
        "em" | "rem" => Some(format_px(number * ROOT_FONT_SIZE)),
        "vw" => Some(format_px(number / 100.0 * ctx.viewport.width)),
        "vh" => Some(format_px(number / 100.0 * ctx.viewport.height)),
        "%" => parent_px.map(|parent| format_px(number / 100.0 * parent)),
        _ => None,
    })
}

/// Reads a single pixel length (`12px`, `12.5px`, or a bare `0`).
pub fn parse_px(value: &str) -> Option<f64> {
    let token = value.split_whitespace().next()?;
    if let Some(number) = token.strip_suffix("px") {
        return number.parse().ok();
    }
    match token.parse::<f64>() {
        Ok(n) if n == 0.0 => Some(0.0),
        _ => None,
    }
}

/// Formats a pixel length without trailing zeros.
pub fn format_px(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        return format!("{}px", value.round() as i64);
    }
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}px", text)
}

fn replace_size_keywords(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        let size = ABSOLUTE_SIZES
            .iter()
            .find(|(keyword, _)| word.eq_ignore_ascii_case(keyword));
        match size {
            Some((_, factor)) => out.push_str(&format_px(ROOT_FONT_SIZE * factor)),
            None => out.push_str(word),
        }
        word.clear();
    };

    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            word.push(ch);
        } else {
            flush(&mut word, &mut out);
            out.push(ch);
        }
    }
    flush(&mut word, &mut out);
    out
}

/// Finds `<number><unit>` tokens and lets `convert` replace them.
fn rewrite_numbers(value: &str, mut convert: impl FnMut(f64, &str) -> Option<String>) -> String {
    let chars: Vec<char> = value.chars().collect();
    let digit_at = |i: usize| chars.get(i).is_some_and(|c| c.is_ascii_digit());
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < chars.len() {
        let starts_number = digit_at(i) || (chars[i] == '.' && digit_at(i + 1));
        if !starts_number || !number_may_start(&chars, i) {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let start = i;
        while digit_at(i) {
            i += 1;
        }
        if chars.get(i) == Some(&'.') && digit_at(i + 1) {
            i += 1;
            while digit_at(i) {
                i += 1;
            }
        }
        let number_end = i;
        if chars.get(i) == Some(&'%') {
            i += 1;
        } else {
            while chars.get(i).is_some_and(|c| c.is_ascii_alphabetic()) {
                i += 1;
            }
        }

        let ends_cleanly = chars
            .get(i)
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'));
        let literal: String = chars[start..number_end].iter().collect();
        let unit: String = chars[number_end..i].iter().collect();

        let replacement = match literal.parse::<f64>() {
            Ok(number) if ends_cleanly && !unit.is_empty() => convert(number, &unit),
            _ => None,
        };
        match replacement {
            Some(text) => out.push_str(&text),
            None => out.extend(&chars[start..i]),
        }
    }
    out
}

/// A number token cannot continue an identifier, hash or another number.
fn number_may_start(chars: &[char], i: usize) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    match i.checked_sub(1).map(|p| chars[p]) {
        None => true,
        Some(prev) if is_ident(prev) || prev == '#' || prev == '.' => false,
        Some('-') => match i.checked_sub(2).map(|p| chars[p]) {
            Some(before) => !(is_ident(before) || before == '-'),
            None => true,
        },
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(property: &'a str, parent_value: Option<&'a str>) -> UnitContext<'a> {
        UnitContext {
            property,
            viewport: Viewport::new(200.0, 50.0),
            parent_value,
        }
    }

    #[test]
    fn test_em_and_rem() {
        assert_eq!(resolve_units("2em", &ctx("margin-top", None)), "32px");
        assert_eq!(resolve_units("1.5rem 0 .5em", &ctx("margin", None)), "24px 0 8px");
        assert_eq!(resolve_units("-1em", &ctx("left", None)), "-16px");
    }

    #[test]
    fn test_viewport_units() {
        assert_eq!(resolve_units("50vw", &ctx("width", None)), "100px");
        assert_eq!(resolve_units("10vh", &ctx("height", None)), "5px");
    }

    #[test]
    fn test_percentage_against_parent() {
        assert_eq!(resolve_units("50%", &ctx("width", Some("100px"))), "50px");
        assert_eq!(resolve_units("50%", &ctx("width", Some("auto"))), "50%");
        assert_eq!(resolve_units("50%", &ctx("width", None)), "50%");
        assert_eq!(resolve_units("calc(25% + 1em)", &ctx("width", Some("10px"))), "calc(2.5px + 16px)");
    }

    #[test]
    fn test_size_keywords_only_for_font_size() {
        assert_eq!(resolve_units("medium", &ctx("font-size", None)), "16px");
        assert_eq!(resolve_units("X-Large", &ctx("font-size", None)), "24px");
        assert_eq!(resolve_units("small", &ctx("font-size", None)), "14.2222px");
        assert_eq!(resolve_units("bold large serif", &ctx("font", None)), "bold 19.2px serif");
        assert_eq!(resolve_units("medium", &ctx("border-width", None)), "medium");
    }

    #[test]
    fn test_identifiers_and_hashes_are_left_alone() {
        assert_eq!(resolve_units("h1em", &ctx("x", None)), "h1em");
        assert_eq!(resolve_units("#12em00", &ctx("color", None)), "#12em00");
        assert_eq!(resolve_units("var(--gap-2em)", &ctx("x", None)), "var(--gap-2em)");
        assert_eq!(resolve_units("2emx", &ctx("x", None)), "2emx");
        assert_eq!(resolve_units("10px", &ctx("x", None)), "10px");
    }

    #[test]
    fn test_parse_and_format_px() {
        assert_eq!(parse_px("100px"), Some(100.0));
        assert_eq!(parse_px("12.5px !important"), Some(12.5));
        assert_eq!(parse_px("0"), Some(0.0));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(format_px(19.2), "19.2px");
        assert_eq!(format_px(3.0), "3px");
    }
}

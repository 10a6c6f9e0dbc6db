use once_cell::sync::Lazy;
use ratatui::style::Color;
use syntect::parsing::{SyntaxReference, SyntaxSet};

pub static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Look up a syntax by extension, full name or token, falling back to plain
/// text for languages the default set does not know.
pub fn find_syntax(name: &str) -> &'static SyntaxReference {
    SYNTAX_SET
        .find_syntax_by_extension(name)
        .or_else(|| SYNTAX_SET.find_syntax_by_name(name))
        .or_else(|| SYNTAX_SET.find_syntax_by_token(name))
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

pub fn to_rgb(color: syntect::highlighting::Color) -> Option<Color> {
    Some(Color::Rgb(color.r, color.g, color.b))
}

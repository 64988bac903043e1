use std::{
    fmt::Display,
    sync::{LazyLock, PoisonError, RwLock},
};

use keel_config::display::TableStyle;
use nu_ansi_term::Color;
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{peaker::PriorityMax, themes::BorderCorrection, Panel, Style, Width},
};

pub struct Icons;

impl Icons {
    pub const ARROW: &str = "→";
    pub const CROSS: &str = "✗";
    pub const PACKAGE: &str = "📦";
    pub const RUNTIME: &str = "⚙";
}

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub fn set_color(enabled: bool) {
    let mut color = COLOR.write().unwrap_or_else(PoisonError::into_inner);
    *color = enabled;
}

pub fn term_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap_or_else(PoisonError::into_inner);
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

/// Serializes `value` for a structured log field.
pub fn json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Renders `builder` with a header panel in the configured style, wrapped to the
/// terminal width.
pub fn render_table(builder: Builder, header: &str, style: TableStyle) -> String {
    let mut table = builder.build();
    table.with(Panel::header(header));
    match style {
        TableStyle::Rounded => table.with(Style::rounded()),
        TableStyle::Ascii => table.with(Style::ascii()),
        TableStyle::Markdown => table.with(Style::markdown()),
        TableStyle::Blank => table.with(Style::blank()),
    };
    table
        .with(BorderCorrection {})
        .with(Width::wrap(term_width()).priority(PriorityMax::default()))
        .to_string()
}

#[cfg(test)]
mod tests {
    use nu_ansi_term::Color::Red;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_colored_respects_switch() {
        set_color(false);
        assert_eq!(Colored(Red, "plain").to_string(), "plain");

        set_color(true);
        let painted = Colored(Red, "red").to_string();
        assert!(painted.contains("red"));
        assert_ne!(painted, "red");
    }

    #[test]
    fn test_json_string() {
        assert_eq!(json_string(&vec!["a", "b"]), "[\"a\",\"b\"]");
    }

    #[test]
    #[serial]
    fn test_render_table() {
        set_color(false);
        let mut builder = Builder::new();
        builder.push_record(["Name", "Foo"]);

        let rendered = render_table(builder, "Package", TableStyle::Ascii);
        assert!(rendered.contains("Package"));
        assert!(rendered.contains("Foo"));
        assert!(rendered.contains('+'));
        set_color(true);
    }
}

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};

/// Display settings for CLI output formatting
#[derive(Clone, Debug, Default, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct DisplaySettings {
    /// Table style: "rounded", "ascii", "markdown" or "blank"
    /// Default: "rounded"
    pub table_style: Option<TableStyle>,

    /// Colorize human-readable output
    /// Default: true
    pub colors: Option<bool>,

    /// Show yanked versions in `info` output
    /// Default: false
    pub show_yanked: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableStyle {
    /// Unicode box drawing with rounded corners
    #[default]
    Rounded,
    /// Plain ASCII borders
    Ascii,
    /// Markdown pipe table
    Markdown,
    /// No borders at all
    Blank,
}

impl DisplaySettings {
    pub fn table_style(&self) -> TableStyle {
        self.table_style.unwrap_or_default()
    }

    pub fn colors(&self) -> bool {
        self.colors.unwrap_or(true)
    }

    pub fn show_yanked(&self) -> bool {
        self.show_yanked.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DisplaySettings::default();
        assert_eq!(settings.table_style(), TableStyle::Rounded);
        assert!(settings.colors());
        assert!(!settings.show_yanked());
    }

    #[test]
    fn test_table_style_names() {
        let settings: DisplaySettings =
            toml::from_str("table_style = \"markdown\"\ncolors = false\n").unwrap();
        assert_eq!(settings.table_style(), TableStyle::Markdown);
        assert!(!settings.colors());

        assert!(toml::from_str::<DisplaySettings>("table_style = \"fancy\"").is_err());
    }
}

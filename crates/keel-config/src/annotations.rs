use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{Decor, Item, RawString, Table};
use tracing::warn;

use crate::error::{ConfigError, Result};

/// Appends `docs` to the comment prefix of `decor`, one `#` line per doc line.
///
/// An existing prefix is kept. When it ends in a comment, a bare `#` separates it from
/// the new lines.
pub fn append_docs_as_toml_comments(decor: &mut Decor, docs: &str) {
    let comments: String = docs
        .lines()
        .map(|line| {
            if line.is_empty() {
                "#\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect();

    let existing = decor
        .prefix()
        .and_then(RawString::as_str)
        .unwrap_or_default();
    let new_prefix = match existing.lines().last() {
        None => comments,
        Some("") => format!("{existing}{comments}"),
        Some(_) => format!("{existing}#\n{comments}"),
    };
    decor.set_prefix(new_prefix);
}

/// Writes the field docs of `T` above each matching key of `table`.
///
/// Non-root tables also get the container docs of `T`. Keys without field docs are
/// left bare.
pub fn annotate_toml_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        append_docs_as_toml_comments(table.decor_mut(), T::DOCS);
    }

    for (mut key_mut, value_item) in table.iter_mut() {
        let key_str = key_mut.get();
        match T::get_field_docs(key_str) {
            Ok(docs) => {
                match value_item {
                    Item::None => {
                        return Err(ConfigError::UnexpectedTomlItem(key_str.into()));
                    }
                    Item::Value(_) => append_docs_as_toml_comments(key_mut.leaf_decor_mut(), docs),
                    Item::Table(sub_table) => {
                        append_docs_as_toml_comments(sub_table.decor_mut(), docs)
                    }
                    Item::ArrayOfTables(array) => {
                        if let Some(first_table) = array.iter_mut().next() {
                            append_docs_as_toml_comments(first_table.decor_mut(), docs);
                        }
                    }
                }
            }
            Err(_) => {
                warn!(
                    field = key_str,
                    container = type_name::<T>(),
                    "no documentation for config field"
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use toml_edit::Decor;

    use super::*;
    use crate::config::Config;

    #[test]
    fn test_append_docs_as_toml_comments() {
        let mut decor = Decor::new("", "");
        append_docs_as_toml_comments(&mut decor, "Test documentation");

        let prefix = decor.prefix().and_then(|p| p.as_str()).unwrap();
        assert!(prefix.contains("# Test documentation"));
    }

    #[test]
    fn test_append_docs_multiline() {
        let mut decor = Decor::new("", "");
        append_docs_as_toml_comments(&mut decor, "Line 1\nLine 2\nLine 3");

        let prefix = decor.prefix().and_then(|p| p.as_str()).unwrap();
        assert!(prefix.contains("# Line 1"));
        assert!(prefix.contains("# Line 2"));
        assert!(prefix.contains("# Line 3"));
    }

    #[test]
    fn test_append_docs_empty_lines() {
        let mut decor = Decor::new("", "");
        append_docs_as_toml_comments(&mut decor, "Line 1\n\nLine 2");

        let prefix = decor.prefix().and_then(|p| p.as_str()).unwrap();
        assert!(prefix.contains("#\n"));
    }

    #[test]
    fn test_annotate_toml_document() {
        let config = Config::default_config();
        let doc = config.to_annotated_document().unwrap().to_string();

        assert!(doc.contains("# Depot roots searched for registries"));
        assert!(doc.contains("# Display settings for CLI output formatting"));
        assert!(doc.contains("# Table style"));
    }

    #[test]
    fn test_annotate_unknown_field_is_skipped() {
        let mut doc = "depots = []
unknown = 1
"
            .parse::<toml_edit::DocumentMut>()
            .unwrap();
        annotate_toml_table::<Config>(doc.as_table_mut(), true).unwrap();

        let rendered = doc.to_string();
        assert!(rendered.contains("# Depot roots"));
        assert!(rendered.contains("unknown = 1"));
    }
}

//! Query templates.
//!
//! A template is a SPARQL fragment file named after a query (the first
//! segment of a predicate's property path). Sections of interest are fenced
//! by a placeholder marker on both sides:
//!
//! ```text
//! #VARIABLES ?target ?distance #VARIABLES
//! #SELECTOR
//!   ?robot :distanceTo ?target .
//! #SELECTOR
//! ```
//!
//! A section is whatever lies between the first and the last occurrence of
//! its marker.

use std::path::PathBuf;

use hashbrown::HashMap;

use crate::config::CompilerConfig;
use crate::{Error, Result};

/// Where template text comes from.
pub trait TemplateSource: Send + Sync {
    /// Full text of the template for `query_name`.
    fn template(&self, query_name: &str) -> Result<String>;
}

/// Templates stored as `<dir>/<query_name>.sparql`.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    dir: PathBuf,
}

impl DirTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, query_name: &str) -> PathBuf {
        self.dir.join(format!("{query_name}.sparql"))
    }
}

impl TemplateSource for DirTemplates {
    fn template(&self, query_name: &str) -> Result<String> {
        let path = self.path_of(query_name);
        std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("No query template for \"{query_name}\" at {}: {e}", path.display()))
        })
    }
}

/// In-memory templates keyed by query name.
#[derive(Debug, Clone, Default)]
pub struct InlineTemplates {
    templates: HashMap<String, String>,
}

impl InlineTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(query_name.into(), text.into());
        self
    }
}

impl TemplateSource for InlineTemplates {
    fn template(&self, query_name: &str) -> Result<String> {
        self.templates
            .get(query_name)
            .cloned()
            .ok_or_else(|| Error::Config(format!("No query template for \"{query_name}\"")))
    }
}

/// The three sections a predicate contributes to a combined query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTemplate {
    /// WHERE-clause body. Required.
    pub selector: String,
    /// Projected variables. Optional.
    pub variables: String,
    /// ORDER BY terms. Optional.
    pub order: String,
}

impl QueryTemplate {
    /// Cut the sections out of a template's text.
    pub fn extract(query_name: &str, text: &str, config: &CompilerConfig) -> Result<Self> {
        let selector = section(text, &config.selector_placeholder).ok_or_else(|| {
            Error::Config(format!(
                "The query template for \"{query_name}\" does not contain the required {} placeholder pair",
                config.selector_placeholder
            ))
        })?;
        Ok(Self {
            selector: selector.to_string(),
            variables: section(text, &config.variables_placeholder).unwrap_or_default().to_string(),
            order: section(text, &config.order_placeholder).unwrap_or_default().to_string(),
        })
    }
}

/// Text between the first and last occurrence of `marker`; `None` unless the
/// marker occurs at least twice.
fn section<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    let first = text.find(marker)?;
    let last = text.rfind(marker)?;
    if last == first {
        return None;
    }
    Some(&text[first + marker.len()..last])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "#VARIABLES ?target #VARIABLES\n#SELECTOR\n?r :near ?target .\n#SELECTOR\n";

    #[test]
    fn test_extract_sections() {
        let t = QueryTemplate::extract("distance_to", TEMPLATE, &CompilerConfig::default()).unwrap();
        assert_eq!(t.selector, "\n?r :near ?target .\n");
        assert_eq!(t.variables, " ?target ");
        assert_eq!(t.order, "");
    }

    #[test]
    fn test_section_spans_first_to_last_marker() {
        assert_eq!(section("#S a #S b #S", "#S"), Some(" a #S b "));
        assert_eq!(section("#S only once", "#S"), None);
        assert_eq!(section("nothing", "#S"), None);
    }

    #[test]
    fn test_missing_selector_is_config_error() {
        let err = QueryTemplate::extract("speed", "#ORDER ?x #ORDER", &CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("speed")), "{err:?}");
    }

    #[test]
    fn test_inline_missing_template() {
        let templates = InlineTemplates::new().with("speed", TEMPLATE);
        assert!(templates.template("speed").is_ok());
        assert!(matches!(templates.template("heading"), Err(Error::Config(_))));
    }

    #[test]
    fn test_dir_templates_path() {
        let dir = DirTemplates::new("/opt/queries");
        assert_eq!(dir.path_of("speed"), PathBuf::from("/opt/queries/speed.sparql"));
        assert!(matches!(dir.template("speed"), Err(Error::Config(_))));
    }
}

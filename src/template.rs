//! System-prompt templating.
//!
//! `render` substitutes `{{name}}` placeholders from a variable map. Strict
//! mode treats unresolved placeholders as a configuration error and reports
//! every missing name; lenient mode substitutes the empty string.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AgentError, Result};

/// How unresolved placeholders are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateMode {
    /// Unresolved placeholders fail the render
    #[default]
    Strict,
    /// Unresolved placeholders become the empty string
    Lenient,
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.-]*)\s*\}\}").expect("valid placeholder regex")
    })
}

/// Render a template by substituting `{{name}}` placeholders.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use femtoagent::template::{render, TemplateMode};
///
/// let vars = HashMap::from([("name".to_string(), "Alice".to_string())]);
/// let out = render("Hello {{name}}!", &vars, TemplateMode::Strict).unwrap();
/// assert_eq!(out, "Hello Alice!");
/// ```
pub fn render(
    template: &str,
    vars: &HashMap<String, String>,
    mode: TemplateMode,
) -> Result<String> {
    let mut missing: Vec<String> = Vec::new();

    let rendered = placeholder_re()
        .replace_all(template, |caps: &regex::Captures| {
            let key = &caps[1];
            match vars.get(key) {
                Some(value) => value.clone(),
                None => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        })
        .into_owned();

    if mode == TemplateMode::Strict && !missing.is_empty() {
        missing.sort();
        missing.dedup();
        return Err(AgentError::Template(format!(
            "unresolved template variables: {}",
            missing.join(", ")
        )));
    }

    Ok(rendered)
}

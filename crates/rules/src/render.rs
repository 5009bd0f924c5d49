//! Resolves references inside rule parameters against a booking's view.
//!
//! - `"${booking.phone}"`: the whole string is a reference; it resolves to the
//!   typed value at that path (lists stay lists, numbers stay numbers).
//! - `"Dear {{ booking.customer_name }}"`: rendered as a template into a string.
//! - Anything else passes through unchanged. Lists and maps are walked.
//!
//! Failures are per booking: the same rule can resolve for one booking and
//! not for another, so nothing here is a configuration error.

use bookwatch_notify::TemplateRenderer;
use serde_json::Value;

use crate::error::RenderError;
use crate::registry::Params;

/// Whether a parameter value is resolved at run time, so its literal shape
/// cannot be checked when rules are loaded.
pub fn is_reference(value: &Value) -> bool {
    match value {
        Value::String(s) => reference_path(s).is_some() || is_template(s),
        _ => false,
    }
}

fn reference_path(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains('{') || inner.contains('}') {
        return None;
    }
    Some(inner.trim())
}

fn is_template(s: &str) -> bool {
    s.contains("{{") || s.contains("{%")
}

/// Locate a dotted path (`booking.options.0`) inside a JSON value.
fn locate<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Renders parameter maps before they reach a condition or action.
#[derive(Debug, Default)]
pub struct ParameterRenderer {
    templates: TemplateRenderer,
}

impl ParameterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render every parameter. The first unresolvable reference fails the
    /// whole map.
    pub fn render(&self, params: &Params, view: &Value) -> Result<Params, RenderError> {
        params
            .iter()
            .map(|(name, value)| Ok::<_, RenderError>((name.to_string(), self.render_value(value, view)?)))
            .collect()
    }

    pub fn render_value(&self, value: &Value, view: &Value) -> Result<Value, RenderError> {
        match value {
            Value::String(s) => {
                if let Some(path) = reference_path(s) {
                    return match locate(view, path) {
                        Some(Value::Null) | None => Err(RenderError::Unresolved(path.to_string())),
                        Some(found) => Ok(found.clone()),
                    };
                }
                if is_template(s) {
                    return self
                        .templates
                        .render(s, view)
                        .map(Value::String)
                        .map_err(|e| RenderError::Template(e.to_string()));
                }
                Ok(value.clone())
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item, view))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| Ok::<_, RenderError>((k.clone(), self.render_value(v, view)?)))
                .collect::<Result<serde_json::Map<_, _>, RenderError>>()
                .map(Value::Object),
            _ => Ok(value.clone()),
        }
    }
}

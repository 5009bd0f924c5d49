//! Minijinja template rendering for message bodies and rule parameters.
//!
//! Templates are arbitrary strings taken from the rule source (not
//! pre-registered), so a fresh [`minijinja::Environment`] is created per
//! render call. Undefined variables are errors: a message with a silently
//! blank customer name is worse than no message.

use serde::Serialize;

use crate::traits::NotifyError;

/// Renders templates using minijinja with strict undefined handling.
#[derive(Debug)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Build a configured minijinja environment with custom filters.
    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

        env.add_filter("mask", mask_filter);
        env.add_filter("lower", lower_filter);
        env.add_filter("upper", upper_filter);

        env
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// references a value the context does not define.
    pub fn render<S: Serialize>(&self, template_str: &str, ctx: &S) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Validate that a template string parses without errors.
    ///
    /// This does not evaluate the template, it only checks syntax.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Custom filter: mask all but the last four digits of a phone number.
fn mask_filter(value: String) -> String {
    bookwatch_core::mask_phone(&value)
}

fn lower_filter(value: String) -> String {
    value.to_lowercase()
}

fn upper_filter(value: String) -> String {
    value.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_context() -> serde_json::Value {
        json!({
            "booking": {
                "customer_name": "Sato",
                "phone": "090-1234-5678",
                "scheduled_clock": "18:30",
                "options": ["cake", "flowers"],
                "note": null,
            },
            "store": { "name": "Shibuya" },
        })
    }

    #[test]
    fn render_basic_template() {
        let renderer = TemplateRenderer::new();
        let out = renderer
            .render("{{ booking.customer_name }} at {{ store.name }}, {{ booking.scheduled_clock }}", &sample_context())
            .unwrap();
        assert_eq!(out, "Sato at Shibuya, 18:30");
    }

    #[test]
    fn render_mask_filter() {
        let renderer = TemplateRenderer::new();
        let out = renderer.render("{{ booking.phone | mask }}", &sample_context()).unwrap();
        assert_eq!(out, "***-****-5678");
    }

    #[test]
    fn render_upper_lower_filters() {
        let renderer = TemplateRenderer::new();
        let ctx = sample_context();
        assert_eq!(renderer.render("{{ store.name | upper }}", &ctx).unwrap(), "SHIBUYA");
        assert_eq!(renderer.render("{{ store.name | lower }}", &ctx).unwrap(), "shibuya");
    }

    #[test]
    fn render_list_iteration() {
        let renderer = TemplateRenderer::new();
        let tpl = "{% for o in booking.options %}{{ o }}{% if not loop.last %}, {% endif %}{% endfor %}";
        assert_eq!(renderer.render(tpl, &sample_context()).unwrap(), "cake, flowers");
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render("Hello {{ booking.nickname }}", &sample_context());
        match result.unwrap_err() {
            NotifyError::Template(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Template error, got: {:?}", other),
        }
    }

    #[test]
    fn null_values_render_as_none() {
        let renderer = TemplateRenderer::new();
        let out = renderer.render("Note: {{ booking.note }}", &sample_context()).unwrap();
        assert_eq!(out, "Note: none");
    }

    #[test]
    fn validate_rejects_unclosed_tag() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.validate("Hello {{ booking.customer_name }}").is_ok());
        assert!(renderer.validate("{{ unclosed").is_err());
    }
}

//! Message template syntax and usage.

use std::collections::HashSet;

use bookwatch_notify::TemplateRenderer;

use super::ValidationResult;
use crate::schema::RuleDocument;

pub(super) fn validate_templates(
    doc: &RuleDocument,
    renderer: &TemplateRenderer,
    result: &mut ValidationResult,
) {
    for (name, template) in &doc.templates {
        for (store, body) in template.bodies() {
            let path = match store {
                None => format!("templates.{name}.body"),
                Some(store) => format!("templates.{name}.stores.{store}"),
            };
            if body.trim().is_empty() {
                result.error(path, "template body must not be empty");
                continue;
            }
            if let Err(e) = renderer.validate(body) {
                result.error(path, e.to_string());
            }
        }
    }

    let used: HashSet<&str> = doc
        .rules
        .iter()
        .flat_map(|rule| rule.actions.iter())
        .filter_map(|action| action.parameters.get("template"))
        .filter_map(|value| value.as_str())
        .collect();
    for name in doc.templates.keys() {
        if !used.contains(name.as_str()) {
            result.warn(format!("templates.{name}"), "template is not used by any rule");
        }
    }
}

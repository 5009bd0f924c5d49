//! Rule names, type names and parameters.

use std::collections::HashSet;

use bookwatch_notify::TemplateRenderer;

use super::fuzzy::{fuzzy_match, is_kebab_case};
use super::ValidationResult;
use crate::registry::{ActionRegistry, CheckScope, ConditionRegistry, ParamSpec, Params};
use crate::render::is_reference;
use crate::schema::RuleDocument;

pub(super) fn validate_names(doc: &RuleDocument, result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (i, rule) in doc.rules.iter().enumerate() {
        let path = format!("rules[{i}].name");
        let name = rule.name.trim();
        if name.is_empty() {
            result.error(path, "rule name must not be empty");
            continue;
        }
        if !seen.insert(name) {
            result.error(path, format!("duplicate rule name '{name}'"));
            continue;
        }
        if !is_kebab_case(name) {
            result.warn(path, format!("rule name '{name}' is not kebab-case"));
        }
    }
}

pub(super) fn validate_specs(
    doc: &RuleDocument,
    conditions: &ConditionRegistry,
    actions: &ActionRegistry,
    renderer: &TemplateRenderer,
    result: &mut ValidationResult,
) {
    let scope = CheckScope {
        templates: &doc.templates,
        renderer,
    };
    let condition_names = conditions.names();
    let action_names = actions.names();

    for (i, rule) in doc.rules.iter().enumerate() {
        for (j, spec) in rule.conditions.iter().enumerate() {
            let path = format!("rules[{i}].conditions[{j}]");
            let Some(condition) = conditions.get(&spec.kind) else {
                result.error_with_suggestion(
                    format!("{path}.type"),
                    format!("unknown condition type '{}'", spec.kind),
                    fuzzy_match(&spec.kind, &condition_names),
                );
                continue;
            };
            if check_params(&path, &spec.parameters, condition.params(), result) {
                if let Err(message) = condition.check(&spec.parameters, &scope) {
                    result.error(format!("{path}.parameters"), message);
                }
            }
        }

        for (j, spec) in rule.actions.iter().enumerate() {
            let path = format!("rules[{i}].actions[{j}]");
            let Some(action) = actions.get(&spec.kind) else {
                result.error_with_suggestion(
                    format!("{path}.type"),
                    format!("unknown action type '{}'", spec.kind),
                    fuzzy_match(&spec.kind, &action_names),
                );
                continue;
            };
            if check_params(&path, &spec.parameters, action.params(), result) {
                if let Err(message) = action.check(&spec.parameters, &scope) {
                    result.error(format!("{path}.parameters"), message);
                }
            }
        }
    }
}

/// Presence and literal shape of declared parameters. Returns whether the
/// parameters passed, so type-specific checks only see well-formed input.
fn check_params(
    path: &str,
    params: &Params,
    specs: &[ParamSpec],
    result: &mut ValidationResult,
) -> bool {
    let mut ok = true;
    for spec in specs {
        let param_path = format!("{path}.parameters.{}", spec.name);
        match params.get(spec.name) {
            None | Some(serde_json::Value::Null) if spec.required => {
                result.error(param_path, format!("missing required parameter '{}'", spec.name));
                ok = false;
            }
            None | Some(serde_json::Value::Null) => {}
            Some(value) if is_reference(value) => {}
            Some(value) if !spec.kind.accepts(value) => {
                result.error(
                    param_path,
                    format!("parameter '{}' must be {}", spec.name, spec.kind.describe()),
                );
                ok = false;
            }
            Some(_) => {}
        }
    }

    let known: Vec<&str> = specs.iter().map(|s| s.name).collect();
    for (name, _) in params.iter() {
        if known.contains(&name) {
            continue;
        }
        let message = match fuzzy_match(name, &known) {
            Some(close) => format!("unknown parameter '{name}' is ignored (did you mean '{close}'?)"),
            None => format!("unknown parameter '{name}' is ignored"),
        };
        result.warn(format!("{path}.parameters.{name}"), message);
    }
    ok
}

use serde_json::json;

use super::*;

const DOCUMENT_YAML: &str = r#"
rules:
  - name: reminder
    description: Send the guide two hours before the visit
    enabled: true
    conditions:
      - type: within-time-window
        parameters:
          hours: 2
      - type: flag-not-set
        parameters:
          name: reminder-sent
    actions:
      - type: send-message
        parameters:
          channel: sms
          template: guide
          target: customer
      - type: set-flag
        parameters:
          name: reminder-sent
templates:
  guide:
    body: "Hello {{ booking.customer_name }}"
    stores:
      store-02: "Welcome {{ booking.customer_name }}"
stores:
  store-02:
    name: Ebisu
    chat_target: ebisu-room
    opening_hour: 17
"#;

#[test]
fn parse_full_document() {
    let doc = RuleDocument::from_yaml(DOCUMENT_YAML).unwrap();

    assert_eq!(doc.rules.len(), 1);
    let rule = &doc.rules[0];
    assert_eq!(rule.name, "reminder");
    assert!(rule.enabled);
    assert_eq!(rule.conditions.len(), 2);
    assert_eq!(rule.conditions[0].kind, "within-time-window");
    assert_eq!(rule.conditions[0].parameters.get("hours"), Some(&json!(2)));
    assert_eq!(rule.actions[1].kind, "set-flag");

    let guide = &doc.templates["guide"];
    assert_eq!(guide.body_for("store-01"), "Hello {{ booking.customer_name }}");
    assert_eq!(guide.body_for("store-02"), "Welcome {{ booking.customer_name }}");

    let store = &doc.stores["store-02"];
    assert_eq!(store.name, "Ebisu");
    assert_eq!(store.chat_target.as_deref(), Some("ebisu-room"));
    assert_eq!(store.extra.get("opening_hour"), Some(&json!(17)));
}

#[test]
fn parse_bare_rule_list() {
    let yaml = r#"
- name: first
  actions:
    - type: emit-log-event
      parameters:
        event: seen
- name: second
  enabled: false
"#;
    let doc = RuleDocument::from_yaml(yaml).unwrap();
    let names: Vec<_> = doc.rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second"]);
    assert!(doc.rules[0].enabled);
    assert!(!doc.rules[1].enabled);
    assert!(doc.rules[1].conditions.is_empty());
    assert!(doc.templates.is_empty());
}

#[test]
fn parse_json_source() {
    let raw = r#"[{"name": "json-rule", "description": "", "enabled": true,
        "conditions": [{"type": "store-in", "parameters": {"ids": ["s1", "s2"]}}],
        "actions": []}]"#;
    let doc = RuleDocument::from_yaml(raw).unwrap();
    assert_eq!(
        doc.rules[0].conditions[0].parameters.get("ids"),
        Some(&json!(["s1", "s2"]))
    );
}

#[test]
fn missing_rules_key_is_a_parse_error() {
    assert!(RuleDocument::from_yaml("templates: {}\n").is_err());
}

#[test]
fn document_roundtrips_through_yaml() {
    let doc = RuleDocument::from_yaml(DOCUMENT_YAML).unwrap();
    let again = RuleDocument::from_yaml(&doc.to_yaml().unwrap()).unwrap();
    assert_eq!(doc, again);
}

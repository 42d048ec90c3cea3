//! `{{field}}` substitution for mini-app prompt templates

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replace every placeholder that has a matching input; others are left as written
pub fn render(template: &str, inputs: &Map<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match inputs.get(&caps[1]) {
            Some(value) => stringify(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct placeholder names in order of first appearance
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}

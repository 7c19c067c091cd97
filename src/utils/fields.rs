//! Loose field lookup
//!
//! Forms and spreadsheet tabs spell the same column many ways
//! (`Mobile_Number`, `mobileNumber`, `phone`). Keys are compared after
//! folding: lowercase, with everything but letters and digits removed.

use std::collections::HashMap;

use serde_json::Value;

/// Fold a field name for comparison
pub fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Something that can be searched by folded field name
pub trait FieldSource {
    /// First non-blank value under any of `aliases`, in alias order
    fn lookup(&self, aliases: &[&str]) -> Option<String>;
}

impl FieldSource for HashMap<String, String> {
    fn lookup(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            let wanted = fold_key(alias);
            self.iter()
                .find(|(key, value)| fold_key(key) == wanted && !value.trim().is_empty())
                .map(|(_, value)| value.trim().to_string())
        })
    }
}

impl FieldSource for serde_json::Map<String, Value> {
    fn lookup(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            let wanted = fold_key(alias);
            self.iter()
                .filter(|(key, _)| fold_key(key) == wanted)
                .find_map(|(_, value)| scalar_to_string(value))
        })
    }
}

/// Render a JSON scalar as a trimmed string. Blank strings, null, arrays
/// and objects count as absent.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Interpret a form value as a checkbox
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "on" | "1" | "checked"
    )
}

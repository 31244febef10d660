//! # Message Templates
//!
//! Error messages declared in schemas may contain `${...}` placeholders.
//! Substitution is a pure function over a resolver callback; the schema
//! engine supplies a resolver that reads JSON pointers out of validated
//! data. Placeholders the resolver cannot answer render as the empty
//! string, and an unterminated `${` is emitted verbatim.

/// Substitute every `${key}` in `template` with `resolve(key)`.
pub fn render<F>(template: &str, resolve: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                if let Some(value) = resolve(after[..end].trim()) {
                    out.push_str(&value);
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Render a JSON value for inclusion in a message: strings without quotes,
/// everything else in compact JSON.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

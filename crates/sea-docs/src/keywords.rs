//! Keywords consulted while validating document entities. All three read
//! the [`Catalog`] passed to the engine, which during document mutation is
//! the document model itself.

use serde_json::Value;

use sea_core::path;
use sea_core::status::OK;
use sea_schema::{Catalog, KeywordDefinition, KeywordInput};

pub const VALID_MODEL: &str = "validModel";
pub const UNIQUE_PATH: &str = "uniquePath";
pub const NEED_200: &str = "need200";

pub fn all() -> Vec<(&'static str, KeywordDefinition)> {
    vec![
        (VALID_MODEL, KeywordDefinition::new(true, valid_model)),
        (UNIQUE_PATH, KeywordDefinition::new(true, unique_path)),
        (NEED_200, KeywordDefinition::new(true, need_200)),
    ]
}

/// The string names a registered model.
fn valid_model(input: &KeywordInput<'_>, catalog: &dyn Catalog) -> bool {
    input
        .data
        .as_str()
        .map(|name| catalog.contains_model(name))
        .unwrap_or(false)
}

/// The object's `path` and `method` are not documented yet. Objects
/// without both fields pass; `required` reports them.
fn unique_path(input: &KeywordInput<'_>, catalog: &dyn Catalog) -> bool {
    let path = input.data.get("path").and_then(Value::as_str);
    let method = input.data.get("method").and_then(Value::as_str);
    match (path, method) {
        (Some(p), Some(m)) => !catalog.contains_path(&path::normalize(p), &m.to_ascii_lowercase()),
        _ => true,
    }
}

/// The responses array declares a `200`.
fn need_200(input: &KeywordInput<'_>, _catalog: &dyn Catalog) -> bool {
    input
        .data
        .as_array()
        .map(|responses| {
            responses.iter().any(|r| {
                r.get("statusCode").and_then(Value::as_f64) == Some(f64::from(OK))
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed;

    impl Catalog for Fixed {
        fn contains_model(&self, name: &str) -> bool {
            name == "Known"
        }
        fn contains_path(&self, path: &str, method: &str) -> bool {
            path == "/a/{id}" && method == "get"
        }
    }

    static ON: Value = Value::Bool(true);

    fn input(data: &Value) -> KeywordInput<'_> {
        KeywordInput {
            value: &ON,
            data,
            parent: None,
            root: data,
            instance_path: "",
        }
    }

    #[test]
    fn model_lookup() {
        assert!(valid_model(&input(&json!("Known")), &Fixed));
        assert!(!valid_model(&input(&json!("Other")), &Fixed));
        assert!(!valid_model(&input(&json!(1)), &Fixed));
    }

    #[test]
    fn path_uniqueness_uses_normalized_key() {
        let taken = json!({"path": "/a/:id/", "method": "GET"});
        let free = json!({"path": "/a/:id", "method": "post"});
        assert!(!unique_path(&input(&taken), &Fixed));
        assert!(unique_path(&input(&free), &Fixed));
        assert!(unique_path(&input(&json!({"path": "/a/:id"})), &Fixed));
    }

    #[test]
    fn responses_need_ok() {
        let ok = json!([{"statusCode": 400}, {"statusCode": 200}]);
        let missing = json!([{"statusCode": 201}]);
        assert!(need_200(&input(&ok), &Fixed));
        assert!(!need_200(&input(&missing), &Fixed));
        assert!(!need_200(&input(&json!({})), &Fixed));
    }
}

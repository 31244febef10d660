//! # Built-in Keywords
//!
//! Registered by [`SchemaEngine::new`](crate::SchemaEngine::new):
//!
//! | Keyword           | Passes when                                   |
//! |-------------------|-----------------------------------------------|
//! | `validStatusCode` | the number is a registered HTTP status code   |
//! | `file`            | the string names an existing filesystem path  |

use std::path::Path;

use sea_core::is_known_status;

use crate::keyword::KeywordDefinition;

pub const VALID_STATUS_CODE: &str = "validStatusCode";
pub const FILE: &str = "file";

pub fn valid_status_code() -> KeywordDefinition {
    KeywordDefinition::new(true, |input, _| {
        input
            .data
            .as_f64()
            .filter(|n| n.fract() == 0.0 && *n >= 0.0)
            .map(|n| is_known_status(n as u64))
            .unwrap_or(false)
    })
}

pub fn file() -> KeywordDefinition {
    KeywordDefinition::new(true, |input, _| {
        input
            .data
            .as_str()
            .map(|p| !p.is_empty() && Path::new(p).exists())
            .unwrap_or(false)
    })
}

/// Every built-in keyword, in registration order.
pub fn all() -> Vec<(&'static str, KeywordDefinition)> {
    vec![(VALID_STATUS_CODE, valid_status_code()), (FILE, file())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::KeywordInput;
    use serde_json::{json, Value};

    fn eval(kw: &KeywordDefinition, data: &Value) -> bool {
        let on = json!(true);
        kw.evaluate(
            &KeywordInput {
                value: &on,
                data,
                parent: None,
                root: data,
                instance_path: "",
            },
            &(),
        )
    }

    #[test]
    fn status_codes() {
        let kw = valid_status_code();
        assert!(eval(&kw, &json!(200)));
        assert!(eval(&kw, &json!(404.0)));
        assert!(!eval(&kw, &json!(299)));
        assert!(!eval(&kw, &json!(200.5)));
        assert!(!eval(&kw, &json!("200")));
    }

    #[test]
    fn file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let kw = file();
        assert!(eval(&kw, &json!(dir.path().to_str().unwrap())));
        assert!(!eval(&kw, &json!(dir.path().join("missing").to_str().unwrap())));
        assert!(!eval(&kw, &json!("")));
        assert!(!eval(&kw, &json!(12)));
    }
}

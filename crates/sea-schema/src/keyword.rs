//! # Custom Keywords
//!
//! A custom keyword is a named predicate evaluated wherever the keyword
//! appears in a schema. Predicates receive the value under validation and
//! a [`Catalog`], the read-only view of registered models and documented
//! paths. The catalog is handed in per call, so keywords such as
//! `validModel` never hold a reference back to the document model.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Read-only view of documented entities, consulted by keyword predicates.
pub trait Catalog: Send + Sync {
    /// `true` when a model named `name` is registered.
    fn contains_model(&self, name: &str) -> bool;

    /// `true` when `(path, method)` is already documented. `path` is in
    /// uniqueness-key form and `method` is lower-case.
    fn contains_path(&self, path: &str, method: &str) -> bool;
}

/// The empty catalog: no models, no paths.
impl Catalog for () {
    fn contains_model(&self, _name: &str) -> bool {
        false
    }

    fn contains_path(&self, _path: &str, _method: &str) -> bool {
        false
    }
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn contains_model(&self, name: &str) -> bool {
        (**self).contains_model(name)
    }

    fn contains_path(&self, path: &str, method: &str) -> bool {
        (**self).contains_path(path, method)
    }
}

/// Arguments passed to a keyword predicate.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInput<'a> {
    /// The keyword's value in the schema (`true` in `{"file": true}`).
    pub value: &'a Value,
    /// The data at the location the keyword applies to.
    pub data: &'a Value,
    /// The object or array containing `data`, if any.
    pub parent: Option<&'a Value>,
    /// The root of the validated document.
    pub root: &'a Value,
    /// JSON Pointer to `data`.
    pub instance_path: &'a str,
}

type Predicate = dyn Fn(&KeywordInput<'_>, &dyn Catalog) -> bool + Send + Sync;

/// A registered keyword.
///
/// With `errors` set, a failure is reported at the data location with the
/// keyword name, so schema `errorMessage` declarations can target it.
/// Without it, the failure is a single document-level error carrying no
/// field detail.
#[derive(Clone)]
pub struct KeywordDefinition {
    errors: bool,
    predicate: Arc<Predicate>,
}

impl KeywordDefinition {
    pub fn new<F>(errors: bool, predicate: F) -> Self
    where
        F: Fn(&KeywordInput<'_>, &dyn Catalog) -> bool + Send + Sync + 'static,
    {
        Self {
            errors,
            predicate: Arc::new(predicate),
        }
    }

    /// Whether failures carry field-level detail.
    pub fn errors(&self) -> bool {
        self.errors
    }

    /// Evaluate the predicate. A keyword whose schema value is `false` is
    /// switched off and always passes.
    pub fn evaluate(&self, input: &KeywordInput<'_>, catalog: &dyn Catalog) -> bool {
        if input.value == &Value::Bool(false) {
            return true;
        }
        (self.predicate)(input, catalog)
    }
}

impl fmt::Debug for KeywordDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeywordDefinition")
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input<'a>(value: &'a Value, data: &'a Value) -> KeywordInput<'a> {
        KeywordInput {
            value,
            data,
            parent: None,
            root: data,
            instance_path: "",
        }
    }

    #[test]
    fn predicate_sees_data() {
        let kw = KeywordDefinition::new(true, |i, _| i.data.as_str() == Some("ok"));
        let on = json!(true);
        assert!(kw.evaluate(&input(&on, &json!("ok")), &()));
        assert!(!kw.evaluate(&input(&on, &json!("no")), &()));
    }

    #[test]
    fn false_value_disables_keyword() {
        let kw = KeywordDefinition::new(true, |_, _| false);
        let off = json!(false);
        assert!(kw.evaluate(&input(&off, &json!(1)), &()));
    }

    #[test]
    fn unit_catalog_is_empty() {
        assert!(!().contains_model("Any"));
        assert!(!().contains_path("/", "get"));
    }
}

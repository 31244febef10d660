//! Read-only walk over schema and data together, after normalization.
//! Evaluates custom keywords and records where `errorMessage` is declared.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::FieldError;
use crate::keyword::{Catalog, KeywordDefinition, KeywordInput};
use crate::messages::Declaration;
use crate::pointer;
use crate::resolve::{Resolver, MAX_REF_HOPS};

pub(crate) struct Walk<'s, 'd, 'k> {
    resolver: &'k Resolver<'s>,
    keywords: &'k HashMap<String, KeywordDefinition>,
    catalog: &'k dyn Catalog,
    root: &'d Value,
    pub(crate) errors: Vec<FieldError>,
    pub(crate) declarations: Vec<Declaration<'s>>,
}

impl<'s, 'd, 'k> Walk<'s, 'd, 'k> {
    pub(crate) fn new(
        resolver: &'k Resolver<'s>,
        keywords: &'k HashMap<String, KeywordDefinition>,
        catalog: &'k dyn Catalog,
        root: &'d Value,
    ) -> Self {
        Self {
            resolver,
            keywords,
            catalog,
            root,
            errors: Vec::new(),
            declarations: Vec::new(),
        }
    }

    pub(crate) fn run(&mut self, doc: &'s Value) {
        let root = self.root;
        self.visit(doc, doc, root, None, &mut Vec::new(), "", 0);
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &mut self,
        doc: &'s Value,
        node: &'s Value,
        data: &'d Value,
        parent: Option<&'d Value>,
        path: &mut Vec<String>,
        schema_path: &str,
        hops: u8,
    ) {
        let Some(schema) = node.as_object() else {
            return;
        };

        if let Some(spec) = schema.get("errorMessage") {
            let order = self.declarations.len();
            self.declarations.push(Declaration {
                path: path.clone(),
                spec,
                order,
            });
        }

        let instance_path = pointer::join(path);
        for (key, value) in schema {
            let Some(definition) = self.keywords.get(key) else {
                continue;
            };
            let input = KeywordInput {
                value,
                data,
                parent,
                root: self.root,
                instance_path: &instance_path,
            };
            if definition.evaluate(&input, self.catalog) {
                continue;
            }
            tracing::trace!(keyword = %key, path = %instance_path, "custom keyword failed");
            let message = format!("must pass \"{key}\" keyword validation");
            self.errors.push(if definition.errors() {
                FieldError {
                    instance_path: instance_path.clone(),
                    schema_path: format!("{schema_path}/{key}"),
                    keyword: key.clone(),
                    property: None,
                    message,
                }
            } else {
                FieldError {
                    instance_path: String::new(),
                    schema_path: String::new(),
                    keyword: key.clone(),
                    property: None,
                    message,
                }
            });
        }

        if hops < MAX_REF_HOPS {
            if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
                if let Some((target_doc, target)) = self.resolver.resolve(doc, reference) {
                    let sp = format!("{schema_path}/$ref");
                    self.visit(target_doc, target, data, parent, path, &sp, hops + 1);
                }
            }
            if let Some(branches) = schema.get("allOf").and_then(Value::as_array) {
                for (i, branch) in branches.iter().enumerate() {
                    let sp = format!("{schema_path}/allOf/{i}");
                    self.visit(doc, branch, data, parent, path, &sp, hops + 1);
                }
            }
            // A combinator passes when one branch raises no custom keyword errors.
            for combinator in ["anyOf", "oneOf"] {
                let Some(branches) = schema.get(combinator).and_then(Value::as_array) else {
                    continue;
                };
                let before = self.errors.len();
                let mut clean = false;
                for (i, branch) in branches.iter().enumerate() {
                    let start = self.errors.len();
                    let sp = format!("{schema_path}/{combinator}/{i}");
                    self.visit(doc, branch, data, parent, path, &sp, hops + 1);
                    if self.errors.len() == start {
                        clean = true;
                        break;
                    }
                }
                if clean {
                    self.errors.truncate(before);
                }
            }
        }

        match data {
            Value::Object(map) => {
                let properties = schema.get("properties").and_then(Value::as_object);
                if let Some(properties) = properties {
                    for (key, sub) in properties {
                        if let Some(child) = map.get(key) {
                            let sp = format!("{schema_path}/properties/{key}");
                            path.push(key.clone());
                            self.visit(doc, sub, child, Some(data), path, &sp, 0);
                            path.pop();
                        }
                    }
                }
                if let Some(extra) = schema.get("additionalProperties").filter(|v| v.is_object()) {
                    for (key, child) in map {
                        if properties.map(|p| p.contains_key(key)).unwrap_or(false) {
                            continue;
                        }
                        let sp = format!("{schema_path}/additionalProperties");
                        path.push(key.clone());
                        self.visit(doc, extra, child, Some(data), path, &sp, 0);
                        path.pop();
                    }
                }
            }
            Value::Array(items) => {
                if let Some(item_schema) = schema.get("items").filter(|v| v.is_object()) {
                    for (i, item) in items.iter().enumerate() {
                        let sp = format!("{schema_path}/items");
                        path.push(i.to_string());
                        self.visit(doc, item_schema, item, Some(data), path, &sp, 0);
                        path.pop();
                    }
                }
            }
            _ => {}
        }
    }
}

/// `true` when `keyword` appears in a schema position the walk evaluates.
/// Property names inside `properties` maps are not schema positions.
pub(crate) fn uses_keyword(schema: &Value, keyword: &str) -> bool {
    let Some(map) = schema.as_object() else {
        return false;
    };
    if map.contains_key(keyword) {
        return true;
    }
    const SUBSCHEMA: [&str; 2] = ["items", "additionalProperties"];
    const SUBSCHEMA_MAPS: [&str; 3] = ["properties", "$defs", "definitions"];
    const SUBSCHEMA_LISTS: [&str; 3] = ["allOf", "anyOf", "oneOf"];

    SUBSCHEMA
        .iter()
        .filter_map(|k| map.get(*k))
        .any(|s| uses_keyword(s, keyword))
        || SUBSCHEMA_MAPS
            .iter()
            .filter_map(|k| map.get(*k).and_then(Value::as_object))
            .flat_map(|m| m.values())
            .any(|s| uses_keyword(s, keyword))
        || SUBSCHEMA_LISTS
            .iter()
            .filter_map(|k| map.get(*k).and_then(Value::as_array))
            .flatten()
            .any(|s| uses_keyword(s, keyword))
        || map
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
            .map(|m| m.values().any(|s| uses_keyword(s, keyword)))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn keywords() -> HashMap<String, KeywordDefinition> {
        let mut m = HashMap::new();
        m.insert(
            "even".to_string(),
            KeywordDefinition::new(true, |i, _| {
                i.data.as_i64().map(|n| n % 2 == 0).unwrap_or(false)
            }),
        );
        m.insert(
            "quiet".to_string(),
            KeywordDefinition::new(false, |_, _| false),
        );
        m
    }

    #[test]
    fn keyword_failures_carry_location() {
        let schema = json!({"properties": {"list": {"items": {"even": true}}}});
        let data = json!({"list": [2, 3]});
        let sources = BTreeMap::new();
        let resolver = Resolver::new(&sources);
        let kws = keywords();
        let mut walk = Walk::new(&resolver, &kws, &(), &data);
        walk.run(&schema);
        assert_eq!(walk.errors.len(), 1);
        assert_eq!(walk.errors[0].instance_path, "/list/1");
        assert_eq!(walk.errors[0].keyword, "even");
        assert_eq!(walk.errors[0].schema_path, "/properties/list/items/even");
    }

    #[test]
    fn errorless_keywords_report_at_root() {
        let schema = json!({"properties": {"a": {"quiet": true}}});
        let data = json!({"a": 1});
        let sources = BTreeMap::new();
        let resolver = Resolver::new(&sources);
        let kws = keywords();
        let mut walk = Walk::new(&resolver, &kws, &(), &data);
        walk.run(&schema);
        assert_eq!(walk.errors.len(), 1);
        assert_eq!(walk.errors[0].instance_path, "");
    }

    #[test]
    fn declarations_are_recorded_in_visit_order() {
        let schema = json!({
            "errorMessage": "outer",
            "properties": {"a": {"errorMessage": "inner"}}
        });
        let data = json!({"a": 1});
        let sources = BTreeMap::new();
        let resolver = Resolver::new(&sources);
        let kws = HashMap::new();
        let mut walk = Walk::new(&resolver, &kws, &(), &data);
        walk.run(&schema);
        assert_eq!(walk.declarations.len(), 2);
        assert_eq!(walk.declarations[1].path, vec!["a".to_string()]);
    }

    #[test]
    fn keyword_usage_ignores_property_names() {
        let schema = json!({"properties": {"file": {"type": "string"}}});
        assert!(!uses_keyword(&schema, "file"));
        let schema = json!({"properties": {"path": {"file": true}}});
        assert!(uses_keyword(&schema, "file"));
        let schema = json!({"anyOf": [{"items": {"file": true}}]});
        assert!(uses_keyword(&schema, "file"));
    }

    #[test]
    fn any_passing_branch_clears_combinator_errors() {
        let sources = BTreeMap::new();
        let resolver = Resolver::new(&sources);
        let kws = keywords();
        for combinator in ["anyOf", "oneOf"] {
            let schema = json!({combinator: [{"quiet": true}, {"even": true}]});

            let data = json!(2);
            let mut walk = Walk::new(&resolver, &kws, &(), &data);
            walk.run(&schema);
            assert!(walk.errors.is_empty(), "{combinator}: {:?}", walk.errors);

            let data = json!(3);
            let mut walk = Walk::new(&resolver, &kws, &(), &data);
            walk.run(&schema);
            assert_eq!(walk.errors.len(), 2, "{combinator}");
            assert_eq!(walk.errors[1].schema_path, format!("/{combinator}/1/even"));
        }
    }

    #[test]
    fn keywords_in_unevaluated_positions_are_not_in_use() {
        for schema in [
            json!({"not": {"file": true}}),
            json!({"if": {"file": true}, "then": {}}),
            json!({"patternProperties": {"^x": {"file": true}}}),
            json!({"prefixItems": [{"file": true}]}),
        ] {
            assert!(!uses_keyword(&schema, "file"), "{schema}");
        }
        assert!(uses_keyword(&json!({"oneOf": [{}, {"file": true}]}), "file"));
    }
}

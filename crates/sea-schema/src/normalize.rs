//! In-place normalization applied before validation.
//!
//! ## Coercion
//!
//! When the data does not already match any declared `type`, the first
//! declared type it can be converted to wins:
//!
//! | Target    | Accepted input                                        |
//! |-----------|-------------------------------------------------------|
//! | `number`  | numeric string, `true`/`false` (1/0), `null` (0)      |
//! | `integer` | as `number`, when the result has no fraction          |
//! | `string`  | number, boolean, `null` (`""`)                        |
//! | `boolean` | `"true"`/`"false"`, `0`/`1`, `null` (`false`)         |
//! | `null`    | `""`, `0`, `false`                                    |
//!
//! ## Stripping
//!
//! An object schema with `properties` is closed unless it says otherwise:
//! undeclared keys are removed when `additionalProperties` is absent or
//! `false`, and there is no `patternProperties`, `$ref` or combinator at
//! the same node. `allOf` branches never strip, since each branch only
//! sees part of the declared property set. `anyOf`/`oneOf` branches are
//! not descended into at all.

use serde_json::{Number, Value};

use crate::resolve::{Resolver, MAX_REF_HOPS};

pub(crate) fn normalize<'s>(
    resolver: &Resolver<'s>,
    doc: &'s Value,
    node: &'s Value,
    data: &mut Value,
    strip_allowed: bool,
    hops: u8,
) {
    let Some(schema) = node.as_object() else {
        return;
    };

    if let Some(types) = schema.get("type") {
        coerce(data, types);
    }

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        if hops < MAX_REF_HOPS {
            if let Some((target_doc, target)) = resolver.resolve(doc, reference) {
                let strip = strip_allowed && !schema.contains_key("properties");
                normalize(resolver, target_doc, target, data, strip, hops + 1);
            }
        }
    }

    if let Some(branches) = schema.get("allOf").and_then(Value::as_array) {
        if hops < MAX_REF_HOPS {
            for branch in branches {
                normalize(resolver, doc, branch, data, false, hops + 1);
            }
        }
    }

    match data {
        Value::Object(map) => {
            let properties = schema.get("properties").and_then(Value::as_object);
            if let Some(properties) = properties {
                for (key, sub) in properties {
                    if let Some(child) = map.get_mut(key) {
                        normalize(resolver, doc, sub, child, true, 0);
                    }
                }
            }

            if let Some(extra) = schema.get("additionalProperties").filter(|v| v.is_object()) {
                for (key, child) in map.iter_mut() {
                    let declared = properties.map(|p| p.contains_key(key)).unwrap_or(false);
                    if !declared {
                        normalize(resolver, doc, extra, child, true, 0);
                    }
                }
            }

            if strip_allowed && is_closed(schema) {
                if let Some(properties) = properties {
                    map.retain(|key, _| properties.contains_key(key));
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items").filter(|v| v.is_object()) {
                for item in items.iter_mut() {
                    normalize(resolver, doc, item_schema, item, true, 0);
                }
            }
        }
        _ => {}
    }
}

fn is_closed(schema: &serde_json::Map<String, Value>) -> bool {
    if !schema.contains_key("properties") {
        return false;
    }
    let additional_closed = match schema.get("additionalProperties") {
        None => true,
        Some(Value::Bool(b)) => !b,
        Some(_) => false,
    };
    additional_closed
        && !["patternProperties", "$ref", "allOf", "anyOf", "oneOf"]
            .iter()
            .any(|k| schema.contains_key(*k))
}

fn coerce(data: &mut Value, types: &Value) {
    let types: Vec<&str> = match types {
        Value::String(s) => vec![s.as_str()],
        Value::Array(list) => list.iter().filter_map(Value::as_str).collect(),
        _ => return,
    };
    if types.iter().any(|t| matches_type(data, t)) {
        return;
    }
    for t in types {
        if let Some(converted) = convert(data, t) {
            *data = converted;
            return;
        }
    }
}

pub(crate) fn matches_type(data: &Value, ty: &str) -> bool {
    match ty {
        "number" => data.is_number(),
        "integer" => data.as_f64().map(|n| n.fract() == 0.0).unwrap_or(false),
        "string" => data.is_string(),
        "boolean" => data.is_boolean(),
        "null" => data.is_null(),
        "object" => data.is_object(),
        "array" => data.is_array(),
        _ => false,
    }
}

fn convert(data: &Value, ty: &str) -> Option<Value> {
    match ty {
        "number" => to_number(data).map(number_value),
        "integer" => to_number(data)
            .filter(|n| n.fract() == 0.0)
            .map(number_value),
        "string" => match data {
            Value::Number(n) => Some(Value::String(format_number(n))),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            Value::Null => Some(Value::String(String::new())),
            _ => None,
        },
        "boolean" => match data {
            Value::String(s) if s == "true" => Some(Value::Bool(true)),
            Value::String(s) if s == "false" => Some(Value::Bool(false)),
            Value::Number(n) if n.as_f64() == Some(1.0) => Some(Value::Bool(true)),
            Value::Number(n) if n.as_f64() == Some(0.0) => Some(Value::Bool(false)),
            Value::Null => Some(Value::Bool(false)),
            _ => None,
        },
        "null" => match data {
            Value::String(s) if s.is_empty() => Some(Value::Null),
            Value::Number(n) if n.as_f64() == Some(0.0) => Some(Value::Null),
            Value::Bool(false) => Some(Value::Null),
            _ => None,
        },
        _ => None,
    }
}

fn to_number(data: &Value) -> Option<f64> {
    match data {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        _ => None,
    }
}

fn number_value(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn run(schema: Value, mut data: Value) -> Value {
        let sources = BTreeMap::new();
        let resolver = Resolver::new(&sources);
        normalize(&resolver, &schema, &schema, &mut data, true, 0);
        data
    }

    #[test]
    fn numeric_strings_become_numbers() {
        let schema = json!({"type": "object", "properties": {"age": {"type": "number"}}});
        assert_eq!(run(schema, json!({"age": "42"})), json!({"age": 42}));
    }

    #[test]
    fn integer_coercion_rejects_fractions() {
        let schema = json!({"properties": {"n": {"type": "integer"}}});
        assert_eq!(run(schema.clone(), json!({"n": "7"})), json!({"n": 7}));
        assert_eq!(run(schema, json!({"n": "7.5"})), json!({"n": "7.5"}));
    }

    #[test]
    fn non_numeric_strings_are_left_alone() {
        let schema = json!({"properties": {"id": {"type": "integer"}}});
        assert_eq!(run(schema, json!({"id": "xxx"})), json!({"id": "xxx"}));
    }

    #[test]
    fn strings_and_booleans() {
        let schema = json!({"properties": {
            "s": {"type": "string"},
            "b": {"type": "boolean"},
            "f": {"type": "string"}
        }});
        assert_eq!(
            run(schema, json!({"s": 3, "b": "true", "f": 1.5})),
            json!({"s": "3", "b": true, "f": "1.5"})
        );
    }

    #[test]
    fn first_convertible_type_wins() {
        let schema = json!({"properties": {"v": {"type": ["boolean", "number"]}}});
        assert_eq!(run(schema, json!({"v": "12"})), json!({"v": 12}));
    }

    #[test]
    fn undeclared_properties_are_stripped() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        assert_eq!(run(schema, json!({"a": "x", "b": 1})), json!({"a": "x"}));
    }

    #[test]
    fn open_objects_keep_extra_properties() {
        let schema = json!({
            "properties": {"a": {}},
            "additionalProperties": true
        });
        assert_eq!(run(schema, json!({"a": 1, "b": 2})), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn all_of_branches_do_not_strip() {
        let schema = json!({"allOf": [
            {"properties": {"a": {"type": "number"}}},
            {"properties": {"b": {"type": "number"}}}
        ]});
        assert_eq!(
            run(schema, json!({"a": "1", "b": "2", "c": 3})),
            json!({"a": 1, "b": 2, "c": 3})
        );
    }

    #[test]
    fn nested_items_and_local_refs() {
        let schema = json!({
            "$defs": {"n": {"type": "number"}},
            "properties": {"list": {"type": "array", "items": {"$ref": "#/$defs/n"}}}
        });
        assert_eq!(
            run(schema, json!({"list": ["1", "2.5", "x"]})),
            json!({"list": [1, 2.5, "x"]})
        );
    }

    #[test]
    fn self_referencing_ref_terminates() {
        let schema = json!({"$defs": {"loop": {"$ref": "#/$defs/loop"}}, "$ref": "#/$defs/loop"});
        assert_eq!(run(schema, json!(1)), json!(1));
    }
}

//! The `Route` schema every registered route shape is checked against.

use serde_json::{json, Value};

use sea_core::HttpMethod;
use sea_schema::{SchemaConflict, SchemaEngine, SCHEMA_URI_PREFIX};

pub const ROUTE: &str = "Route";

pub fn route() -> Value {
    let allowed = HttpMethod::ALL.map(|m| m.as_str()).join(", ");
    json!({
        "type": "object",
        "required": ["method", "path", "responses"],
        "errorMessage": {
            "required": {
                "method": "Route ${/path} must have method.",
                "path": "Route must have path.",
                "responses": "Route ${/path} must declare possible responses."
            },
            "properties": {
                "method": format!("Method must be one of the following allowed values [{allowed}]"),
                "path": "Path must be in the format URL path, get ${/path}.",
                "originalPath": "Original path of ${/path} must be in the format URL path.",
                "summary": "Summary of ${/path} must be a string.",
                "tags": "Expecting tags of ${/path} to be array of string.",
                "overwrite": "Expecting overwrite of ${/path} to be a boolean.",
                "prefix": "Prefix of ${/path} must be in the format URL path."
            }
        },
        "additionalProperties": true,
        "properties": {
            "method": {"type": "string", "enum": HttpMethod::schema_enum()},
            "path": {"type": "string", "pattern": "^/(.+)?$"},
            "originalPath": {"type": "string", "pattern": "^/(.+)?$"},
            "summary": {"type": "string"},
            "tags": {"type": "array", "items": {"type": "string"}},
            "overwrite": {"type": "boolean"},
            "prefix": {"type": "string", "pattern": "^/(.+)?$"},
            "responses": {
                "type": "array",
                "errorMessage": {
                    "type": "Expecting responses of ${/path} to be a list of { statusCode, modelName, description }."
                },
                "items": {
                    "type": "object",
                    "required": ["modelName", "statusCode", "description"],
                    "errorMessage": {
                        "required": {
                            "modelName": "Route response model name is required.",
                            "statusCode": "Status code is required.",
                            "description": "Route response description is required."
                        },
                        "properties": {
                            "modelName": "Model name ${0/modelName} must be a valid model defined in the document models.",
                            "statusCode": "Status code ${0/statusCode} must be a valid http status code.",
                            "description": "Response description of ${/path} must be at least 5 characters."
                        }
                    },
                    "properties": {
                        "modelName": {"type": "string", "validModel": true},
                        "statusCode": {"type": "number", "validStatusCode": true},
                        "description": {"type": "string", "minLength": 5}
                    }
                }
            },
            "parameters": {"$ref": format!("{SCHEMA_URI_PREFIX}Path#/properties/parameters")},
            "requestBody": {"$ref": format!("{SCHEMA_URI_PREFIX}Path#/properties/requestBody")}
        }
    })
}

/// Register the `Route` schema. The document schemas (and with them the
/// `validModel` keyword) must already be registered.
pub fn register_schema(engine: &mut SchemaEngine) -> Result<(), SchemaConflict> {
    engine.add_schema(route(), ROUTE)
}

//! The `Service` schema the bootstrap definition is validated against.

use serde_json::{json, Value};

pub const SERVICE: &str = "Service";

/// Built-in transport middleware identifiers.
pub const MIDDLEWARE: [&str; 5] = ["compression", "cors", "helmet", "log", "bodyLimit"];

pub fn service() -> Value {
    let allowed = MIDDLEWARE.join(", ");
    let middleware_list = json!({
        "type": "array",
        "items": {
            "anyOf": [
                {"type": "string", "enum": MIDDLEWARE},
                {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string", "enum": MIDDLEWARE},
                        "params": {"type": ["string", "number", "array", "object"]}
                    }
                }
            ]
        }
    });
    let middleware_message = format!(
        "Expecting middleware to be one of the allowed values: {allowed}. \
         It can be in a format {{ name: <allowed middleware>, params: [] }}."
    );

    json!({
        "type": "object",
        "required": ["name", "appDir", "products"],
        "errorMessage": {
            "required": {
                "name": "Application needs a name.",
                "appDir": "We cannot determine app directory unless you will tell.",
                "products": "Application is expecting a product."
            },
            "properties": {
                "name": "Name must be a string that should not be less than 3 characters.",
                "appDir": "App directory ${/appDir} must exist.",
                "products": "Expecting to have at least one product, each a unique name of at least 3 characters."
            }
        },
        "properties": {
            "name": {"type": "string", "minLength": 3},
            "appDir": {"type": "string", "file": true},
            "products": {
                "type": "array",
                "minItems": 1,
                "uniqueItems": true,
                "items": {"type": "string", "minLength": 3}
            },
            "transport": {
                "type": "object",
                "errorMessage": {
                    "properties": {
                        "host": "Application host ${/transport/host} must be an IPv4 address or localhost.",
                        "port": "Application port must be a number between 1000 and 65535.",
                        "middleware": "Expecting middleware to be an object with before and after lists."
                    }
                },
                "properties": {
                    "host": {
                        "type": "string",
                        "pattern": "^(\\d{1,3}\\.\\d{1,3}\\.\\d{1,3}\\.\\d{1,3}|localhost)$"
                    },
                    "port": {"type": "integer", "minimum": 1000, "maximum": 65535},
                    "middleware": {
                        "type": "object",
                        "errorMessage": {
                            "properties": {
                                "before": middleware_message,
                                "after": middleware_message
                            }
                        },
                        "properties": {
                            "before": middleware_list,
                            "after": middleware_list
                        }
                    }
                }
            },
            "document": {
                "type": "object",
                "errorMessage": {
                    "properties": {
                        "title": "Title must be a string that is not less than 3 characters.",
                        "description": "Description must be a string that is not less than 5 characters.",
                        "version": "Version must be a string that is not less than 3 characters."
                    }
                },
                "properties": {
                    "title": {"type": "string", "minLength": 3},
                    "description": {"type": "string", "minLength": 5},
                    "version": {"type": "string", "minLength": 3}
                }
            }
        }
    })
}

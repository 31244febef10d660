//! Entity schemas registered by [`DocumentModel::register`](crate::DocumentModel::register).

use serde_json::{json, Value};

use sea_core::HttpMethod;

pub const DOCUMENT: &str = "Document";
pub const SERVER: &str = "Server";
pub const TAG: &str = "Tag";
pub const MODEL: &str = "Model";
pub const PATH: &str = "Path";

/// Every schema with its name, in registration order.
pub fn all() -> Vec<(&'static str, Value)> {
    vec![
        (DOCUMENT, document()),
        (SERVER, server()),
        (TAG, tag()),
        (MODEL, model()),
        (PATH, path()),
    ]
}

pub fn document() -> Value {
    json!({
        "type": "object",
        "required": ["explorerPath", "publicDir", "baseUrl"],
        "errorMessage": {
            "required": {
                "explorerPath": "Document needs a path where the explorer will be served.",
                "publicDir": "Document needs a directory where explorer assets are placed.",
                "baseUrl": "Document needs the base url of the API for making API calls."
            },
            "properties": {
                "explorerPath": "Explorer path should be in the format /<path_name>.",
                "publicDir": "Expecting a public directory where explorer files will be placed.",
                "baseUrl": "Base URL ${/baseUrl} should be in correct URL format.",
                "title": "Title must be a string that is not less than 3 characters.",
                "description": "Description must be a string that is not less than 5 characters.",
                "version": "Version must be a string."
            }
        },
        "properties": {
            "explorerPath": {"type": "string", "pattern": "^/.+"},
            "publicDir": {"type": "string", "minLength": 1},
            "baseUrl": {
                "anyOf": [
                    {
                        "type": "string",
                        "pattern": "^https?://\\d{1,3}\\.\\d{1,3}\\.\\d{1,3}\\.\\d{1,3}(:\\d{2,5})?$"
                    },
                    {
                        "type": "string",
                        "pattern": "^https?://([a-zA-Z0-9-]+\\.)+[a-zA-Z]{2,8}(:\\d{2,5})?$"
                    },
                    {"type": "string", "pattern": "^https?://localhost(:\\d{2,5})?$"}
                ]
            },
            "title": {"type": "string", "minLength": 3},
            "description": {"type": "string", "minLength": 5},
            "version": {"type": "string"}
        }
    })
}

pub fn server() -> Value {
    json!({
        "type": "object",
        "required": ["url"],
        "errorMessage": {
            "required": {"url": "Url is required."},
            "properties": {"url": "Url ${/url} must be in the correct format."}
        },
        "additionalProperties": true,
        "properties": {
            "url": {"type": "string", "pattern": "^([A-Za-z][A-Za-z0-9+.-]*://\\S+|/\\S*)$"},
            "description": {"type": "string"},
            "overwrite": {"type": "boolean"}
        }
    })
}

pub fn tag() -> Value {
    json!({
        "type": "object",
        "required": ["name"],
        "errorMessage": {
            "required": {"name": "Tag must have name."},
            "properties": {
                "name": "Name must be a string and should not be less than 3 characters.",
                "description": "Description of tag ${/name} must be a string and should not be less than 5 characters.",
                "overwrite": "Expecting overwrite of tag ${/name} to be a boolean."
            }
        },
        "properties": {
            "name": {"type": "string", "minLength": 3},
            "description": {"type": "string", "minLength": 5},
            "overwrite": {"type": "boolean"}
        }
    })
}

pub fn model() -> Value {
    json!({
        "type": "object",
        "required": ["name", "properties"],
        "errorMessage": {
            "required": {
                "name": "Model name is required.",
                "properties": "Model ${/name} must have properties."
            },
            "properties": {
                "name": "Model name must be a string of more than 3 characters starting with a letter.",
                "properties": "Properties of model ${/name} must be a non-empty object.",
                "overwrite": "Expecting overwrite of model ${/name} to be a boolean."
            }
        },
        "additionalProperties": true,
        "properties": {
            "name": {"type": "string", "minLength": 3, "pattern": "^[A-Za-z][A-Za-z0-9_.-]*$"},
            "properties": {"type": "object", "minProperties": 1, "additionalProperties": true},
            "required": {"type": "array", "items": {"type": "string"}},
            "overwrite": {"type": "boolean"},
            "errorMessage": {
                "type": "object",
                "required": ["required", "properties"],
                "additionalProperties": true,
                "errorMessage": {
                    "required": {
                        "required": "errorMessage must have required property.",
                        "properties": "errorMessage must have properties property."
                    },
                    "properties": {
                        "required": "Expecting required as an object of required property messages.",
                        "properties": "Expecting properties as an object."
                    }
                },
                "properties": {
                    "required": {"type": "object"},
                    "properties": {"type": "object"}
                }
            }
        }
    })
}

pub fn path() -> Value {
    json!({
        "type": "object",
        "required": ["path", "method", "summary", "responses"],
        "uniquePath": true,
        "errorMessage": {
            "required": {
                "path": "Path must have endpoint/path.",
                "method": "${/path} Path must have method.",
                "summary": "${/path} Path must have summary of what it is doing.",
                "responses": "${/path} Path must have responses."
            },
            "properties": {
                "path": "Path must be in the format URL path.",
                "tags": "Expecting tags of ${/path} to be array of string.",
                "method": format!(
                    "Method of ${{/path}} should be one of the allowed values [{}]",
                    HttpMethod::ALL.map(|m| m.as_str()).join(", ")
                ),
                "summary": "Summary of ${/path} must be string that should not be less than 5 characters.",
                "overwrite": "Expecting overwrite of ${/path} to be a boolean."
            },
            "uniquePath": "Combination path ${/path} and method ${/method} already exists."
        },
        "additionalProperties": true,
        "properties": {
            "path": {"type": "string", "pattern": "^/(.+)?$"},
            "summary": {"type": "string", "minLength": 5},
            "method": {"type": "string", "enum": HttpMethod::schema_enum()},
            "tags": {"type": "array", "items": {"type": "string"}},
            "overwrite": {"type": "boolean"},
            "responses": {
                "type": "array",
                "minItems": 1,
                "need200": true,
                "errorMessage": {
                    "type": "Responses of ${/path} must be array of object.",
                    "minItems": "Responses of ${/path} must not be empty.",
                    "need200": "Path ${/path} must declare a 200 response."
                },
                "items": {
                    "type": "object",
                    "required": ["modelName", "statusCode", "description"],
                    "errorMessage": {
                        "required": {
                            "modelName": "Path response object must have modelName.",
                            "statusCode": "Path response object must have statusCode.",
                            "description": "Path response object must have description."
                        },
                        "properties": {
                            "modelName": "Response model ${0/modelName} of path ${/path} must be a valid model.",
                            "statusCode": "Response status ${0/statusCode} of path ${/path} must be a valid http status code.",
                            "description": "Response description of path ${/path} must be at least 5 characters."
                        }
                    },
                    "properties": {
                        "modelName": {"type": "string", "minLength": 3, "validModel": true},
                        "statusCode": {"type": "number", "validStatusCode": true},
                        "description": {"type": "string", "minLength": 5}
                    }
                }
            },
            "parameters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["in", "name", "description", "schema"],
                    "errorMessage": {
                        "required": {
                            "in": "Parameter of ${/path} must declare where it is read from.",
                            "name": "Parameter of ${/path} must have a name.",
                            "description": "Parameter ${0/name} of ${/path} must have a description.",
                            "schema": "Parameter ${0/name} of ${/path} must have a schema."
                        },
                        "properties": {
                            "in": "Parameter ${0/name} of ${/path} must be in one of [query, path, header]."
                        }
                    },
                    "additionalProperties": true,
                    "properties": {
                        "in": {"type": "string", "enum": ["query", "path", "header"]},
                        "name": {"type": "string", "minLength": 2},
                        "description": {"type": "string", "minLength": 5},
                        "required": {"type": "boolean"},
                        "schema": {"type": "object"}
                    }
                }
            },
            "requestBody": {
                "type": "object",
                "required": ["modelName"],
                "errorMessage": {
                    "required": {
                        "modelName": "Model name is required when defining the request body."
                    },
                    "properties": {
                        "modelName": "Request body model ${0/modelName} of ${/path} must be a valid model."
                    }
                },
                "additionalProperties": true,
                "properties": {
                    "required": {"type": "boolean"},
                    "modelName": {"type": "string", "minLength": 3, "validModel": true},
                    "description": {"type": "string", "minLength": 5}
                }
            }
        }
    })
}

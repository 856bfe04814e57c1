//! Static OpenAPI description of the HTTP surface.

use serde_json::{Value, json};

use docmeta_core::DocumentMetadata;
use docmeta_openai::strict_schema;

pub const OPENAPI_PATH: &str = "/openapi.json";

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/Error" } }
        }
    })
}

/// Build the OpenAPI 3.0 document served at [`OPENAPI_PATH`].
pub fn document() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "docmeta",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Extract structured metadata from uploaded PDF documents."
        },
        "paths": {
            "/": { "get": health_operation() },
            "/extract": { "post": extract_operation() }
        },
        "components": { "schemas": schemas() }
    })
}

fn health_operation() -> Value {
    json!({
        "summary": "Health check",
        "responses": {
            "200": {
                "description": "Service is up",
                "content": {
                    "application/json": { "schema": { "$ref": "#/components/schemas/Health" } }
                }
            }
        }
    })
}

fn extract_operation() -> Value {
    let request_body = json!({
        "required": true,
        "content": {
            "multipart/form-data": {
                "schema": {
                    "type": "object",
                    "required": ["file"],
                    "properties": {
                        "file": {
                            "type": "string",
                            "format": "binary",
                            "description": "PDF file (.pdf extension required)"
                        }
                    }
                }
            }
        }
    });
    let ok = json!({
        "description": "Metadata extracted",
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/ExtractResponse" } }
        }
    });

    json!({
        "summary": "Extract metadata from a PDF",
        "requestBody": request_body,
        "responses": {
            "200": ok,
            "400": error_response("File missing or not a PDF"),
            "422": error_response("No extractable text in the PDF"),
            "500": error_response("Text extraction or metadata generation failed")
        }
    })
}

/// Rewrite JSON Schema `"type": [T, "null"]` into the OpenAPI 3.0 form
/// `"type": T, "nullable": true`.
fn nullable_types(value: &mut Value) {
    match value {
        Value::Object(map) => {
            let single = match map.get("type") {
                Some(Value::Array(types)) if types.iter().any(|t| t == "null") => {
                    let rest: Vec<&Value> = types.iter().filter(|t| *t != "null").collect();
                    match rest.as_slice() {
                        [only] => Some((*only).clone()),
                        _ => None,
                    }
                }
                _ => None,
            };
            if let Some(ty) = single {
                map.insert("type".to_string(), ty);
                map.insert("nullable".to_string(), Value::Bool(true));
            }

            for (_, v) in map.iter_mut() {
                nullable_types(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                nullable_types(item);
            }
        }
        _ => {}
    }
}

fn schemas() -> Value {
    // Inline the schemars definitions so the schema stands alone under
    // `components`.
    let mut metadata_schema = strict_schema(&DocumentMetadata::json_schema());
    nullable_types(&mut metadata_schema);

    let stats = json!({
        "type": "object",
        "required": ["pageCount", "textLength"],
        "properties": {
            "pageCount": { "type": "integer", "minimum": 0 },
            "textLength": { "type": "integer", "minimum": 0 }
        }
    });
    let extract_response = json!({
        "type": "object",
        "required": ["success", "metadata", "rawText", "stats", "truncated"],
        "properties": {
            "success": { "type": "boolean" },
            "metadata": { "$ref": "#/components/schemas/DocumentMetadata" },
            "rawText": { "type": "string" },
            "stats": stats,
            "truncated": {
                "type": "boolean",
                "description": "Whether the text sent to the model was cut to the prompt budget"
            }
        }
    });

    json!({
        "Health": {
            "type": "object",
            "properties": {
                "status": { "type": "string" },
                "service": { "type": "string" },
                "version": { "type": "string" }
            }
        },
        "Error": {
            "type": "object",
            "required": ["error"],
            "properties": { "error": { "type": "string" } }
        },
        "DocumentMetadata": metadata_schema,
        "ExtractResponse": extract_response
    })
}

//! Rewrite a `schemars` schema into the shape OpenAI strict mode accepts.
//!
//! Strict mode requires:
//! 1. `additionalProperties: false` on every object schema
//! 2. every property listed in `required`, nullable ones included
//! 3. no `$ref` (definitions are inlined)
//! 4. no `definitions` / `$schema` keys at the root

use serde_json::Value;

pub fn strict_schema(schema: &Value) -> Value {
    let mut value = schema.clone();

    fix_object_schemas(&mut value);

    let definitions = value.get("definitions").cloned();
    if let Some(defs) = definitions {
        inline_refs(&mut value, &defs);
    }

    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
    }

    value
}

fn fix_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }

            for (_, v) in map.iter_mut() {
                fix_object_schemas(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                fix_object_schemas(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(type_name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs(value, definitions);
                        return;
                    }
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmeta_core::DocumentMetadata;

    #[test]
    fn metadata_schema_is_strict() {
        let schema = strict_schema(&DocumentMetadata::json_schema());
        let obj = schema.as_object().unwrap();

        assert!(!obj.contains_key("definitions"));
        assert!(!obj.contains_key("$schema"));
        assert_eq!(obj.get("additionalProperties"), Some(&Value::Bool(false)));

        let required: Vec<&str> = obj["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        for key in ["title", "author", "summary", "topics", "keywords", "documentType"] {
            assert!(required.contains(&key), "{key} not required: {required:?}");
        }
    }

    #[test]
    fn no_refs_remain() {
        let schema = strict_schema(&DocumentMetadata::json_schema());
        let text = serde_json::to_string(&schema).unwrap();
        assert!(!text.contains("$ref"), "{text}");
        assert!(text.contains("academic_paper"));
    }

    #[test]
    fn nested_objects_are_fixed() {
        let schema = serde_json::json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": {
                "inner": { "$ref": "#/definitions/Inner" },
                "note": { "type": ["string", "null"] }
            },
            "required": ["inner"],
            "definitions": {
                "Inner": {
                    "type": "object",
                    "properties": { "a": { "type": "string" }, "b": { "type": "integer" } },
                    "required": ["a"]
                }
            }
        });

        let strict = strict_schema(&schema);
        let inner = &strict["properties"]["inner"];

        assert_eq!(inner["type"], "object");
        assert_eq!(inner["additionalProperties"], false);
        assert_eq!(inner["required"].as_array().unwrap().len(), 2);
        assert_eq!(strict["required"].as_array().unwrap().len(), 2);
    }
}

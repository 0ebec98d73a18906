//! JSON schema generation for OpenAI structured outputs.
//!
//! Strict mode accepts a subset of JSON Schema. The schemars output is
//! rewritten so that:
//! 1. every object has `additionalProperties: false`
//! 2. every property is listed in `required`, nullable ones included
//! 3. `$ref`s are inlined and `definitions` dropped
//! 4. `oneOf` becomes `anyOf`, single-entry `allOf` wrappers are flattened,
//!    and `default`/`title`/`$schema` are removed

use schemars::{schema_for, JsonSchema};
use serde_json::{Map, Value};

/// Strict-mode schema for `T`.
pub fn openai_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();

    let definitions = match &mut value {
        Value::Object(map) => {
            map.remove("$schema");
            map.remove("definitions")
        }
        _ => None,
    };

    if let Some(defs) = definitions {
        inline_refs(&mut value, &defs);
    }
    normalize(&mut value);
    fix_objects(&mut value);

    value
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("$ref").cloned() {
                if let Some(def) = path
                    .strip_prefix("#/definitions/")
                    .and_then(|name| definitions.get(name))
                {
                    *value = def.clone();
                    inline_refs(value, definitions);
                    return;
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

fn normalize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("default");
            map.remove("title");

            if let Some(one_of) = map.remove("oneOf") {
                map.insert("anyOf".to_string(), one_of);
            }
            flatten_all_of(map);

            for (key, v) in map.iter_mut() {
                // Property names are data, not schema keywords.
                if key == "properties" {
                    if let Value::Object(props) = v {
                        for (_, prop) in props.iter_mut() {
                            normalize(prop);
                        }
                    }
                } else {
                    normalize(v);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                normalize(item);
            }
        }
        _ => {}
    }
}

fn flatten_all_of(map: &mut Map<String, Value>) {
    let single = matches!(map.get("allOf"), Some(Value::Array(items)) if items.len() == 1);
    if !single {
        return;
    }
    if let Some(Value::Array(mut items)) = map.remove("allOf") {
        if let Some(Value::Object(inner)) = items.pop() {
            for (k, v) in inner {
                map.entry(k).or_insert(v);
            }
        }
    }
}

fn fix_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                let keys: Vec<Value> = match map.get("properties") {
                    Some(Value::Object(props)) => props.keys().cloned().map(Value::String).collect(),
                    _ => Vec::new(),
                };
                map.insert("required".to_string(), Value::Array(keys));
            }
            for (_, v) in map.iter_mut() {
                fix_objects(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                fix_objects(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphvc_core::VCGraph;

    fn walk<'a>(value: &'a Value, out: &mut Vec<&'a Map<String, Value>>) {
        match value {
            Value::Object(map) => {
                out.push(map);
                map.values().for_each(|v| walk(v, out));
            }
            Value::Array(items) => items.iter().for_each(|v| walk(v, out)),
            _ => {}
        }
    }

    #[test]
    fn test_graph_schema_is_strict() {
        let schema = openai_schema::<VCGraph>();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(!text.contains("definitions"));
        assert!(!text.contains("oneOf"));
        assert!(!text.contains("\"allOf\""));
        assert!(!text.contains("\"default\""));

        let mut objects = Vec::new();
        walk(&schema, &mut objects);
        for obj in objects.iter().filter(|o| o.get("type") == Some(&Value::String("object".into()))) {
            assert_eq!(obj.get("additionalProperties"), Some(&Value::Bool(false)));
            let props = obj["properties"].as_object().unwrap();
            let required = obj["required"].as_array().unwrap();
            assert_eq!(props.len(), required.len());
        }
    }

    #[test]
    fn test_node_properties_are_inlined() {
        let schema = openai_schema::<VCGraph>();
        let node = &schema["properties"]["nodes"]["items"];
        let props = &node["properties"]["properties"];
        assert_eq!(props["type"], "object");
        assert!(props["properties"]["amount_usd"].is_object());
        assert_eq!(node["required"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_relationship_names_present() {
        let text = serde_json::to_string(&openai_schema::<VCGraph>()).unwrap();
        for name in ["LED", "INVESTED_IN", "CO_INVESTED", "CLASSIFIED_AS"] {
            assert!(text.contains(name), "{}", name);
        }
    }
}

use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde_json::Value;

/// JSON schema for `T` in the shape chat-completions APIs accept: subschemas
/// inlined, no `$schema` or `definitions` keys.
pub fn json_schema_for<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.option_add_null_type = false;
        })
        .into_generator();
    let root = generator.into_root_schema_for::<T>();

    let mut value = serde_json::to_value(root).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("definitions");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Leg {
        origin: String,
        destination: String,
    }

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct Trip {
        leg: Leg,
        date: Option<String>,
    }

    #[test]
    fn test_schema_is_inlined_and_bare() {
        let schema = json_schema_for::<Trip>();
        assert!(schema.get("$schema").is_none());
        assert!(schema.get("definitions").is_none());
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["leg"]["properties"]["origin"]["type"], "string");
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "leg"));
        assert!(!required.iter().any(|v| v == "date"));
    }
}

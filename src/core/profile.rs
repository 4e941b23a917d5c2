use crate::models::OptionMap;
use serde_json::Value;

/// Flatten a raw profile record into an attribute-name -> bool map.
///
/// Only boolean-valued fields are relevant; ids, option-set numbers and
/// free text are silently skipped. String fields that spell a boolean are
/// accepted, matching the source system which stringifies every field
/// before parsing. With `include_false` set the map mirrors the record's
/// full option surface (accounts); without it only affirmative values
/// survive (contacts).
pub fn extract_options(record: &Value, include_false: bool) -> OptionMap {
    let mut options = OptionMap::new();

    let Some(fields) = record.as_object() else {
        return options;
    };

    for (name, value) in fields {
        let Some(flag) = parse_bool(value) else {
            continue;
        };
        if include_false || flag {
            options.insert(name.clone(), flag);
        }
    }

    options
}

fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

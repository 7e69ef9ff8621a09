use serde_json::{Map, Value};

pub const LAST_AGENT_RESPONSE_KEY: &str = "last_agent_response";
pub const STEP_COMPLETED_KEY: &str = "step_completed";
pub const STEP_ERROR_KEY: &str = "step_error";

/// Working copy of an Activity State. Anything other than a JSON object
/// (absent, unparsable, array, scalar) starts from an empty object.
pub fn load_activity_state(stored: &Value) -> Map<String, Value> {
    match stored {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatePatch {
    /// The step declares no update logic.
    Empty,
    Applied(Map<String, Value>),
    /// Not a JSON object literal; the state was left untouched.
    Malformed,
}

pub fn parse_state_patch(logic: &str) -> StatePatch {
    if logic.trim().is_empty() {
        return StatePatch::Empty;
    }
    match serde_json::from_str::<Value>(logic) {
        Ok(Value::Object(patch)) => StatePatch::Applied(patch),
        _ => StatePatch::Malformed,
    }
}

/// Shallow merge: top-level keys of the patch replace those in the state,
/// nested objects are replaced wholesale.
pub fn merge_state(state: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        state.insert(key.clone(), value.clone());
    }
}

pub fn apply_state_update(state: &mut Map<String, Value>, logic: &str) -> StatePatch {
    let patch = parse_state_patch(logic);
    if let StatePatch::Applied(fields) = &patch {
        merge_state(state, fields);
    }
    patch
}

pub fn record_agent_response(state: &mut Map<String, Value>, response: &str) {
    state.insert(
        LAST_AGENT_RESPONSE_KEY.to_string(),
        Value::String(response.to_string()),
    );
    state.insert(STEP_COMPLETED_KEY.to_string(), Value::Bool(true));
}

pub fn record_agent_error(state: &mut Map<String, Value>, message: &str) {
    state.insert(STEP_ERROR_KEY.to_string(), Value::String(message.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(fields) => fields,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn patch_replaces_keys_and_keeps_the_rest() {
        let mut state = object(json!({"k": "old", "j": 1}));
        let outcome = apply_state_update(&mut state, r#"{"k": "v"}"#);

        assert_eq!(Value::Object(state), json!({"k": "v", "j": 1}));
        assert_eq!(outcome, StatePatch::Applied(object(json!({"k": "v"}))));
    }

    #[test]
    fn nested_objects_are_replaced_not_merged() {
        let mut state = object(json!({"cfg": {"a": 1, "b": 2}}));
        apply_state_update(&mut state, r#"{"cfg": {"a": 3}}"#);
        assert_eq!(Value::Object(state), json!({"cfg": {"a": 3}}));
    }

    #[test]
    fn malformed_or_non_object_logic_leaves_state_unchanged() {
        let original = object(json!({"j": 1}));
        for logic in ["{not json", "[1, 2]", "\"text\"", "42"] {
            let mut state = original.clone();
            assert_eq!(apply_state_update(&mut state, logic), StatePatch::Malformed);
            assert_eq!(state, original);
        }
    }

    #[test]
    fn blank_logic_is_no_patch() {
        let mut state = Map::new();
        assert_eq!(apply_state_update(&mut state, "  "), StatePatch::Empty);
        assert!(state.is_empty());
    }

    #[test]
    fn non_object_stored_state_loads_empty() {
        assert!(load_activity_state(&Value::Null).is_empty());
        assert!(load_activity_state(&json!([1])).is_empty());
        assert_eq!(load_activity_state(&json!({"a": 1})).len(), 1);
    }

    #[test]
    fn agent_outcomes_use_fixed_keys() {
        let mut state = Map::new();
        record_agent_error(&mut state, "timed out");
        record_agent_response(&mut state, "hello");
        assert_eq!(
            Value::Object(state),
            json!({"step_error": "timed out", "last_agent_response": "hello", "step_completed": true})
        );
    }
}

// Log redaction
//
// Request and response bodies are logged at debug level for protocol
// troubleshooting; auth material and pet identifiers must never land in
// logs. Redaction is recursive through nested objects and arrays and
// preserves key order.

use serde_json::Value;

/// Field names redacted from every logged payload.
pub const SENSITIVE_LOG_FIELDS: [&str; 4] =
    ["app_code", "app_verification_code", "petID", "auth_token"];

/// Additional fields redacted from login payloads.
pub const LOGIN_SENSITIVE_FIELDS: [&str; 3] = [
    "login_email",
    "login_password_hash",
    "login_password_hash_md5",
];

fn redact_tree(data: &Value, sensitive: &[&str]) -> Value {
    match data {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    if sensitive.contains(&key.as_str()) {
                        (key.clone(), Value::String("***".into()))
                    } else {
                        (key.clone(), redact_tree(value, sensitive))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| redact_tree(item, sensitive)).collect())
        }
        other => other.clone(),
    }
}

/// Return a copy of `data` with the standard sensitive fields (plus
/// `extra`) replaced by `"***"`.
pub fn redact(data: &Value, extra: &[&str]) -> Value {
    let mut sensitive: Vec<&str> = SENSITIVE_LOG_FIELDS.to_vec();
    sensitive.extend_from_slice(extra);
    redact_tree(data, &sensitive)
}

/// Redact sensitive fields from JSON `text` if it parses; non-JSON text
/// is returned verbatim.
pub fn redact_json(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(data) => redact_tree(&data, &SENSITIVE_LOG_FIELDS).to_string(),
        Err(_) => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn redacts_recursively_through_lists() {
        let data = json!({"list": [{"petID": 1}]});
        assert_eq!(redact(&data, &[]), json!({"list": [{"petID": "***"}]}));
    }

    #[test]
    fn preserves_key_order() {
        let data = json!({"b": 1, "app_code": "secret", "a": 2});
        let redacted = redact(&data, &[]);
        let keys: Vec<&String> = redacted.as_object().expect("object").keys().collect();
        assert_eq!(keys, ["b", "app_code", "a"]);
        assert_eq!(redacted["app_code"], "***");
    }

    #[test]
    fn extra_fields_extend_the_default_set() {
        let data = json!({"login_email": "a@b.c", "petID": 7});
        let redacted = redact(&data, &LOGIN_SENSITIVE_FIELDS);
        assert_eq!(redacted["login_email"], "***");
        assert_eq!(redacted["petID"], "***");
    }

    #[test]
    fn redact_json_passes_non_json_through() {
        assert_eq!(redact_json("not json"), "not json");
        assert_eq!(redact_json(r#"{"petID":1}"#), r#"{"petID":"***"}"#);
    }
}

use std::fmt;

use hydra_protocol::{Envelope, PeerType};
use serde_json::Value;

/// Names the exact validation rule violated, out of the seven rules
/// checked in order below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    MustBeMapping,
    RequiredFieldsPresent,
    SenderValid,
    ElemNonEmpty,
    DataIsMappingOrNull,
    OptionalFieldTypes,
    SizeLimit,
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationRule::MustBeMapping => "value-must-be-mapping",
            ValidationRule::RequiredFieldsPresent => "required-fields-present",
            ValidationRule::SenderValid => "sender-valid",
            ValidationRule::ElemNonEmpty => "elem-non-empty",
            ValidationRule::DataIsMappingOrNull => "data-is-mapping-or-null",
            ValidationRule::OptionalFieldTypes => "optional-field-types",
            ValidationRule::SizeLimit => "size-limit",
        };
        f.write_str(name)
    }
}

const EXPECTED_SCHEMA: &str =
    "{sender: string (required, in ValidPeerTypes), elem: string (required, non-empty), \
     timestamp: number (optional), client_id: string (optional), request_id: string (optional), \
     data: mapping|null (optional)}";

const MAX_TRUNCATED_BODY_LEN: usize = 500;

/// The diagnostic returned alongside a validation failure: everything
/// needed to reconstruct why the envelope was dropped without re-parsing
/// the original bytes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub rule: ValidationRule,
    pub expected_schema: &'static str,
    pub observed_fields: Vec<String>,
    pub observed_types: Vec<(String, &'static str)>,
    pub truncated_body: String,
}

impl Diagnostic {
    fn new(rule: ValidationRule, value: &Value, raw: &[u8]) -> Self {
        let (observed_fields, observed_types) = describe_fields(value);
        Self {
            rule,
            expected_schema: EXPECTED_SCHEMA,
            observed_fields,
            observed_types,
            truncated_body: truncate_body(raw),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe_fields(value: &Value) -> (Vec<String>, Vec<(String, &'static str)>) {
    match value.as_object() {
        Some(map) => {
            let fields: Vec<String> = map.keys().cloned().collect();
            let types = map
                .iter()
                .map(|(k, v)| (k.clone(), json_type_name(v)))
                .collect();
            (fields, types)
        }
        None => (Vec::new(), Vec::new()),
    }
}

fn truncate_body(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    if text.chars().count() <= MAX_TRUNCATED_BODY_LEN {
        text.into_owned()
    } else {
        text.chars().take(MAX_TRUNCATED_BODY_LEN).collect()
    }
}

/// Validates a decoded JSON value against the seven wire-format rules, in
/// order, and constructs the `Envelope` on success. Never panics or
/// propagates as an exception: every failure mode is a `Diagnostic`.
///
/// `raw` is the original serialized bytes, used for rule 7 (size limit) and
/// for the truncated body in diagnostics.
pub fn validate(value: &Value, raw: &[u8], max_bytes: usize) -> Result<Envelope, Diagnostic> {
    // Rule 1: value is a mapping.
    let Some(map) = value.as_object() else {
        return Err(Diagnostic::new(ValidationRule::MustBeMapping, value, raw));
    };

    // Rule 2: required fields sender, elem present.
    if !map.contains_key("sender") || !map.contains_key("elem") {
        return Err(Diagnostic::new(
            ValidationRule::RequiredFieldsPresent,
            value,
            raw,
        ));
    }

    // Rule 3: sender is a non-empty string in ValidPeerTypes.
    let sender = match map.get("sender").and_then(Value::as_str) {
        Some(s) if !s.is_empty() && PeerType::parse_inbound(s).is_some() => s.to_owned(),
        _ => return Err(Diagnostic::new(ValidationRule::SenderValid, value, raw)),
    };

    // Rule 4: elem is a non-empty string.
    let elem = match map.get("elem").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => s.to_owned(),
        _ => return Err(Diagnostic::new(ValidationRule::ElemNonEmpty, value, raw)),
    };

    // Rule 5: data, if present, is a mapping or null.
    let data = match map.get("data") {
        None => None,
        Some(Value::Null) => None,
        Some(Value::Object(obj)) => Some(obj.clone()),
        Some(_) => {
            return Err(Diagnostic::new(
                ValidationRule::DataIsMappingOrNull,
                value,
                raw,
            ))
        }
    };

    // Rule 6: timestamp finite number; client_id/request_id strings, if present.
    let timestamp = match map.get("timestamp") {
        None => hydra_protocol::now_unix_seconds(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.is_finite() => f,
            _ => {
                return Err(Diagnostic::new(
                    ValidationRule::OptionalFieldTypes,
                    value,
                    raw,
                ))
            }
        },
        Some(_) => {
            return Err(Diagnostic::new(
                ValidationRule::OptionalFieldTypes,
                value,
                raw,
            ))
        }
    };
    let client_id = match map.get("client_id") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(Diagnostic::new(
                ValidationRule::OptionalFieldTypes,
                value,
                raw,
            ))
        }
    };
    let request_id = match map.get("request_id") {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(Diagnostic::new(
                ValidationRule::OptionalFieldTypes,
                value,
                raw,
            ))
        }
    };

    // Rule 7: serialized size below the configured ceiling. Applies
    // uniformly, including to heartbeats.
    if raw.len() > max_bytes {
        return Err(Diagnostic::new(ValidationRule::SizeLimit, value, raw));
    }

    Ok(Envelope {
        sender,
        elem,
        timestamp,
        client_id,
        request_id,
        data,
    })
}

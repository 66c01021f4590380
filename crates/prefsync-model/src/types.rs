//! Setting, solution, and handler/finalizer description types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Logical type a setting's value must coerce to and from at every
/// backend boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Integer,
    Double,
    Boolean,
}

impl ValueKind {
    /// Whether `value` already has the declared shape, with no coercion.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Integer => value.is_i64() || value.is_u64(),
            ValueKind::Double => value.is_number(),
            ValueKind::Boolean => value.is_boolean(),
        }
    }

    /// Coerce `value` into the declared kind's canonical JSON shape.
    /// Returns `None` when no lossless conversion exists.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            ValueKind::String => match value {
                Value::String(s) => Some(Value::String(s.clone())),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            ValueKind::Integer => match value {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Some(Value::from(i))
                    } else {
                        // Only integral doubles in i64 range convert.
                        n.as_f64()
                            .filter(|f| {
                                f.fract() == 0.0
                                    && *f >= i64::MIN as f64
                                    && *f <= i64::MAX as f64
                            })
                            .map(|f| Value::from(f as i64))
                    }
                }
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
                _ => None,
            },
            ValueKind::Double => match value {
                Value::Number(n) => n.as_f64().map(Value::from),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::from),
                _ => None,
            },
            ValueKind::Boolean => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(Value::Bool(false)),
                    Some(1) => Some(Value::Bool(true)),
                    _ => None,
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Some(Value::Bool(true)),
                    "false" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
        }
    }
}

/// Native kind of a registry value, declared by the handler description so
/// writes use the type the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryValueKind {
    Dword,
    Qword,
    Sz,
    Binary,
}

/// Where a setting's value physically lives, as declared data. The `type`
/// discriminator selects the handler variant bound at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HandlerDescription {
    /// A value under a key/value store path (e.g. the Windows registry).
    Registry {
        key_path: String,
        value_name: String,
        value_kind: RegistryValueKind,
    },
    /// A key in one section of an INI file.
    Ini {
        file_path: PathBuf,
        section: String,
        key: String,
    },
    /// An opaque system setting addressed by id.
    System { setting_id: String },
    /// "The named process is running" modeled as a boolean setting.
    Process { exe_path: String, desired_state: bool },
    /// A bundle of files under a root directory, selected by literal names
    /// or `*` glob patterns.
    Files {
        root_path: PathBuf,
        patterns: Vec<String>,
    },
    /// The value lives in the preferences document itself.
    Client { preference_key: String },
}

/// Post-apply side effect needed for some backends to take effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinalizerDescription {
    /// Broadcast a system parameter change (SystemParametersInfo-style).
    SystemParametersInfo {
        action: u32,
        #[serde(default)]
        send_change: bool,
        #[serde(default)]
        update_user_profile: bool,
    },
    /// Restart the named process if it is currently running.
    ProcessRestart { exe_path: String },
}

/// One operating-system setting. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Unique within the owning solution.
    pub name: String,
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalizer: Option<FinalizerDescription>,
}

/// A named group of related settings (one application or feature area).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: String,
    pub settings: Vec<Setting>,
}

impl Solution {
    /// Look up a setting by name.
    pub fn setting(&self, name: &str) -> Option<&Setting> {
        self.settings.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_integer_from_string_and_double() {
        assert_eq!(
            ValueKind::Integer.coerce(&json!("42")),
            Some(json!(42))
        );
        assert_eq!(ValueKind::Integer.coerce(&json!(3.0)), Some(json!(3)));
        assert_eq!(ValueKind::Integer.coerce(&json!(3.5)), None);
        assert_eq!(ValueKind::Integer.coerce(&json!("x")), None);
    }

    #[test]
    fn coerce_boolean_accepts_zero_one() {
        assert_eq!(ValueKind::Boolean.coerce(&json!(1)), Some(json!(true)));
        assert_eq!(ValueKind::Boolean.coerce(&json!(0)), Some(json!(false)));
        assert_eq!(ValueKind::Boolean.coerce(&json!(2)), None);
        assert_eq!(
            ValueKind::Boolean.coerce(&json!("True")),
            Some(json!(true))
        );
    }

    #[test]
    fn matches_is_strict() {
        assert!(ValueKind::Double.matches(&json!(1)));
        assert!(!ValueKind::Integer.matches(&json!(1.5)));
        assert!(!ValueKind::Boolean.matches(&json!("true")));
    }

    #[test]
    fn handler_description_tagged_roundtrip() {
        let desc = HandlerDescription::Registry {
            key_path: r"HKEY_CURRENT_USER\Control Panel\Desktop".into(),
            value_name: "CursorBlinkRate".into(),
            value_kind: RegistryValueKind::Sz,
        };
        let text = serde_json::to_string(&desc).unwrap();
        assert!(text.contains(r#""type":"registry""#));
        let back: HandlerDescription = serde_json::from_str(&text).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn finalizer_description_defaults() {
        let parsed: FinalizerDescription = serde_json::from_str(
            r#"{"type":"system_parameters_info","action":47}"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            FinalizerDescription::SystemParametersInfo {
                action: 47,
                send_change: false,
                update_user_profile: false,
            }
        );
    }

    #[test]
    fn setting_document_roundtrip() {
        let text = r#"{
            "name": "blink-rate",
            "kind": "integer",
            "default": 530,
            "handler": {
                "type": "ini",
                "file_path": "C:/app/settings.ini",
                "section": "Cursor",
                "key": "BlinkRate"
            }
        }"#;
        let setting: Setting = serde_json::from_str(text).unwrap();
        assert_eq!(setting.kind, ValueKind::Integer);
        assert_eq!(setting.default, Some(json!(530)));
        assert!(setting.finalizer.is_none());
    }
}

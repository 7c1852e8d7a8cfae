//! The record sent to a remote viewer for every write.
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `{"IsLine": "true"|"false", "Text": "..."}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RemoteMessage {
    #[serde(rename = "IsLine", with = "bool_string")]
    pub is_line: bool,
    #[serde(rename = "Text")]
    pub text: String,
}

impl RemoteMessage {
    pub fn new(text: impl Into<String>, is_line: bool) -> Self {
        Self {
            is_line,
            text: text.into(),
        }
    }
}

/// The viewer expects booleans as the strings `"true"` and `"false"`.
mod bool_string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected \"true\" or \"false\", got {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let json = serde_json::to_string(&RemoteMessage::new("[color white black]hi", true)).unwrap();
        assert_eq!(json, r#"{"IsLine":"true","Text":"[color white black]hi"}"#);
    }

    #[test]
    fn rejects_non_string_flag() {
        assert!(serde_json::from_str::<RemoteMessage>(r#"{"IsLine":true,"Text":"x"}"#).is_err());
        let parsed: RemoteMessage = serde_json::from_str(r#"{"IsLine":"false","Text":"x"}"#).unwrap();
        assert!(!parsed.is_line);
    }
}

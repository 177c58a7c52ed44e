use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How to format a numeric value on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ValueFormat {
    Money { currency: String },
    Number { decimals: u8 },
    Percent { decimals: u8 },
    Integer,
}

/// Presentation hints of a custom widget.
///
/// Keys the backend does not interpret are kept in `extra` so the config
/// round-trips unchanged through the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = json!({
            "title": "Open cases",
            "format": {"kind": "Money", "currency": "EUR"},
            "legendPosition": "bottom"
        });
        let config: DisplayConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.extra.get("legendPosition"), Some(&json!("bottom")));
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }
}

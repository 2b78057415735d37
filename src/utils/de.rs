//! 持久化数据的宽松反序列化

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 接受 `true/false`、`0/1` 或 `null`
pub(crate) fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or_default() != 0),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected bool or integer, got {other}"
        ))),
    }
}

/// 接受字符串数组或 `;` 分隔的字符串
pub(crate) fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let split = |s: &str| -> Vec<String> {
        s.split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    };
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(split(&s)),
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()),
        other => Err(serde::de::Error::custom(format!(
            "expected list or `;`-separated string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "super::bool_or_int")]
        flag: bool,
        #[serde(default, deserialize_with = "super::string_list")]
        items: Vec<String>,
    }

    #[test]
    fn lenient_forms() {
        let sample: Sample = serde_json::from_value(json!({ "flag": 1, "items": "a; b;;c" })).unwrap();
        assert!(sample.flag);
        assert_eq!(sample.items, vec!["a", "b", "c"]);

        let sample: Sample = serde_json::from_value(json!({ "flag": false, "items": ["x"] })).unwrap();
        assert!(!sample.flag);
        assert_eq!(sample.items, vec!["x"]);

        let sample: Sample = serde_json::from_value(json!({})).unwrap();
        assert!(sample.items.is_empty());
    }
}

use crate::utils::error::{RelayError, Result};
use serde::de::DeserializeOwned;

/// 移除模型回覆中的 ```json / ``` 標記
pub fn strip_code_fences(text: &str) -> String {
    text.trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// 去掉程式碼區塊標記後解析 JSON，失敗時保留原始輸出方便除錯
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str(&cleaned).map_err(|e| RelayError::ParseError {
        message: e.to_string(),
        raw: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::AddressPair;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1, 2]\n```\n"), "[1, 2]");
    }

    #[test]
    fn test_parse_fenced_address_pair() {
        let reply = r#"```json
{
  "from": {"first_name": "Ravi", "last_name": "Kumar", "address": "4 Park Street", "city": "Kolkata", "state": "West Bengal", "pincode": "700016", "mobile": "9000000001"},
  "to": {"first_name": "Meera", "last_name": "Iyer", "address": "22 Anna Salai", "city": "Chennai", "state": "Tamil Nadu", "pincode": 600002, "mobile": "9000000002"}
}
```"#;
        let pair: AddressPair = parse_json_reply(reply).unwrap();
        assert_eq!(pair.from.city, "Kolkata");
        assert_eq!(pair.to.pincode, "600002");
    }

    #[test]
    fn test_parse_failure_keeps_raw_output() {
        let err = parse_json_reply::<AddressPair>("I could not read the label.").unwrap_err();
        match err {
            RelayError::ParseError { raw, .. } => assert_eq!(raw, "I could not read the label."),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

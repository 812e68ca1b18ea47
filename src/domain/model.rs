use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 標籤上一方（寄件人或收件人）的地址欄位
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyAddress {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(deserialize_with = "string_or_number")]
    pub pincode: String,
    #[serde(deserialize_with = "string_or_number")]
    pub mobile: String,
}

impl PartyAddress {
    /// 組成路線查詢用的地址字串："{address}, {city}, {state} {pincode}"
    pub fn route_line(&self, country: Option<&str>) -> String {
        let line = format!(
            "{}, {}, {} {}",
            self.address, self.city, self.state, self.pincode
        );
        match country {
            Some(country) if !country.is_empty() => format!("{}, {}", line, country),
            _ => line,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPair {
    #[serde(default)]
    pub from: PartyAddress,
    #[serde(default)]
    pub to: PartyAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    MultipartField,
    RawBody,
    File,
}

#[derive(Debug, Clone)]
pub struct LabelImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub source: ImageSource,
}

impl LabelImage {
    pub fn jpeg(bytes: Vec<u8>, source: ImageSource) -> Self {
        Self {
            bytes,
            mime_type: "image/jpeg".to_string(),
            source,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
}

impl RouteQuery {
    pub fn from_pair(pair: &AddressPair, country: Option<&str>) -> Self {
        Self {
            origin: pair.from.route_line(country),
            destination: pair.to.route_line(country),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distance {
    pub kilometers: f64,
    pub duration_seconds: Option<u64>,
}

impl Distance {
    pub fn from_kilometers(kilometers: f64) -> Self {
        Self {
            kilometers,
            duration_seconds: None,
        }
    }

    pub fn from_meters(meters: u64, duration_seconds: Option<u64>) -> Self {
        Self {
            kilometers: meters as f64 / 1000.0,
            duration_seconds,
        }
    }

    /// 表單只接受整數公里，小數部分直接捨去
    pub fn whole_kilometers(&self) -> u64 {
        if self.kilometers.is_finite() && self.kilometers > 0.0 {
            self.kilometers.trunc() as u64
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSubmission {
    pub fields_filled: usize,
    pub session_closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub addresses: AddressPair,
    pub distance: Distance,
    pub submission: Option<FormSubmission>,
    pub completed_at: DateTime<Utc>,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_accepts_numeric_pincode_and_missing_fields() {
        let json = r#"{"first_name": "Asha", "city": "Pune", "pincode": 411001, "mobile": "9876543210"}"#;
        let party: PartyAddress = serde_json::from_str(json).unwrap();
        assert_eq!(party.first_name, "Asha");
        assert_eq!(party.pincode, "411001");
        assert_eq!(party.mobile, "9876543210");
        assert_eq!(party.last_name, "");
    }

    #[test]
    fn test_route_line_with_and_without_country() {
        let party = PartyAddress {
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
            ..Default::default()
        };
        assert_eq!(party.route_line(None), "12 MG Road, Bengaluru, Karnataka 560001");
        assert_eq!(
            party.route_line(Some("India")),
            "12 MG Road, Bengaluru, Karnataka 560001, India"
        );
        assert_eq!(party.route_line(Some("")), party.route_line(None));
    }

    #[test]
    fn test_whole_kilometers_truncates() {
        assert_eq!(Distance::from_meters(148_950, Some(9000)).whole_kilometers(), 148);
        assert_eq!(Distance::from_kilometers(12.0).whole_kilometers(), 12);
        assert_eq!(Distance::from_kilometers(-3.0).whole_kilometers(), 0);
        assert_eq!(Distance::from_kilometers(f64::NAN).whole_kilometers(), 0);
    }
}

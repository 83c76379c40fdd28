use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operands for `POST /api/demo/sum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumRequest {
    pub a: i32,
    pub b: i32,
}

impl SumRequest {
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }
}

/// Query parameters for `GET /api/demo/sum`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SumQuery {
    pub a: i32,
    pub b: i32,
}

/// Response for `GET /`.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Service version
    pub version: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_request_serialization_matches_signed_body() {
        // Clients sign exactly these bytes
        let json = serde_json::to_string(&SumRequest::new(5, 3)).unwrap();
        assert_eq!(json, r#"{"a":5,"b":3}"#);
    }

    #[test]
    fn test_sum_request_deserialization() {
        let request: SumRequest =
            serde_json::from_str(r#"{"a": -2, "b": 7}"#).expect("Deserialization should succeed");
        assert_eq!(request, SumRequest::new(-2, 7));
    }

    #[test]
    fn test_sum_request_missing_field() {
        assert!(serde_json::from_str::<SumRequest>(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_service_info_serialization() {
        let info = ServiceInfo {
            name: "hmac_sample".to_string(),
            version: "0.1.0".to_string(),
            uptime_seconds: 3,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&info).expect("Serialization should succeed");
        assert!(json.contains("\"name\":\"hmac_sample\""));
    }
}

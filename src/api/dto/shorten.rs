//! DTOs for link shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::link_service::MAX_EXPIRE_IN_HOURS;
use crate::error::ErrorInfo;

/// Request to shorten one or more URLs.
///
/// Supports batch processing for efficiency when creating multiple links.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[validate(length(min = 1, max = 100, message = "Between 1 and 100 URLs per request"))]
    #[validate(nested)]
    pub urls: Vec<UrlItem>,
}

/// Individual URL to be shortened.
///
/// The URL and custom code are checked again by the service, which owns the
/// full rules (scheme, reserved codes).
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UrlItem {
    #[validate(url(message = "Invalid URL format"))]
    pub url: String,

    #[validate(length(min = 3, max = 20))]
    pub custom_code: Option<String>,

    /// Hours until the link returns 410 Gone.
    #[validate(range(min = 1, max = MAX_EXPIRE_IN_HOURS))]
    pub expire_in_hours: Option<u32>,
}

/// Response containing batch processing results.
#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub summary: BatchSummary,
    pub items: Vec<ShortenResultItem>,
}

/// Individual result for a URL in the batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ShortenResultItem {
    Success {
        long_url: String,
        code: String,
        short_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_at: Option<chrono::DateTime<chrono::Utc>>,
    },
    Error {
        long_url: String,
        error: ErrorInfo,
    },
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(count: usize) -> ShortenRequest {
        let urls: Vec<_> = (0..count)
            .map(|i| json!({ "url": format!("https://example.com/{i}") }))
            .collect();
        serde_json::from_value(json!({ "urls": urls })).unwrap()
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(request(1).validate().is_ok());
        assert!(request(100).validate().is_ok());

        for count in [0, 101] {
            let errors = request(count).validate().unwrap_err();
            let field = errors.field_errors();
            let urls = field.get("urls").unwrap();
            assert_eq!(
                urls[0].message.as_deref(),
                Some("Between 1 and 100 URLs per request")
            );
        }
    }

    #[test]
    fn test_nested_item_validation() {
        let req: ShortenRequest = serde_json::from_value(json!({
            "urls": [{ "url": "not a url", "custom_code": "ab" }]
        }))
        .unwrap();

        assert!(req.validate().is_err());
    }
}

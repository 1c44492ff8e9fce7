use std::ops::RangeInclusive;

/// Body some feature servers return under load, with a 200 status.
pub const QUERY_ERROR_SENTINEL: &[u8] =
    br#"{"error":{"code":500,"message":"Error performing query operation","details":[]}}"#;

/// Outcome of one chunk request, judged on status and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    /// Non-success HTTP status.
    HardFailure { status: u16 },
    /// Success status carrying a server-reported error body.
    SoftFailure { status: u16 },
}

/// Detection rule for server errors hidden behind a success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftErrorRule {
    /// Statuses treated as transport success.
    pub success_statuses: RangeInclusive<u16>,
    /// A body containing any of these byte strings is a soft failure.
    pub body_patterns: Vec<Vec<u8>>,
    /// Also treat any JSON body with a top-level `error` member as a soft failure.
    pub match_error_object: bool,
}

impl Default for SoftErrorRule {
    fn default() -> Self {
        Self {
            success_statuses: 200..=299,
            body_patterns: vec![QUERY_ERROR_SENTINEL.to_vec()],
            match_error_object: false,
        }
    }
}

impl SoftErrorRule {
    pub fn classify(&self, status: u16, body: &[u8]) -> ResponseClass {
        if !self.success_statuses.contains(&status) {
            return ResponseClass::HardFailure { status };
        }
        if self.is_soft_error(body) {
            return ResponseClass::SoftFailure { status };
        }
        ResponseClass::Success
    }

    fn is_soft_error(&self, body: &[u8]) -> bool {
        let matches_pattern = self
            .body_patterns
            .iter()
            .filter(|pattern| !pattern.is_empty())
            .any(|pattern| contains(body, pattern));
        matches_pattern || (self.match_error_object && has_error_object(body))
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}

fn has_error_object(body: &[u8]) -> bool {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map.contains_key("error"),
        _ => false,
    }
}

use std::fmt;

use url::Url;

use crate::Chunk;

/// Output field selector requesting every attribute.
pub const ALL_FIELDS: &str = "*";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("invalid endpoint url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("endpoint must use http or https, got {scheme}")]
    UnsupportedScheme { scheme: String },
}

/// Base URL of one feature service layer, e.g. `.../FeatureServer/0`.
///
/// A trailing slash is dropped so query paths can be appended as a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let mut url = Url::parse(raw.trim()).map_err(|err| EndpointError::InvalidUrl {
            url: raw.to_string(),
            message: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EndpointError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .map_err(|()| EndpointError::InvalidUrl {
                url: raw.to_string(),
                message: "url cannot be a base".into(),
            })?
            .pop_if_empty();
        Ok(Self { url })
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// `GET {endpoint}?f=pjson`, answering with `maxRecordCount`.
    pub fn capabilities_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("f", "pjson");
        url
    }

    /// `GET {endpoint}/query?where=1=1&returnIdsOnly=true&f=json`.
    pub fn manifest_url(&self) -> Url {
        let mut url = self.query_base();
        url.query_pairs_mut()
            .append_pair("where", "1=1")
            .append_pair("returnIdsOnly", "true")
            .append_pair("f", "json");
        url
    }

    /// Windowed extraction query for one chunk. Identical for every retry of that chunk.
    pub fn chunk_query_url(&self, chunk: &Chunk, id_field: &str, out_fields: &str) -> Url {
        let mut url = self.query_base();
        url.query_pairs_mut()
            .append_pair("where", &range_filter(id_field, chunk.min_id, chunk.max_id))
            .append_pair("returnGeometry", "true")
            .append_pair("outFields", out_fields)
            .append_pair("f", "json");
        url
    }

    fn query_base(&self) -> Url {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("query");
        }
        url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// `"{field} >= {min} and {field} <= {max}"`
pub fn range_filter(id_field: &str, min_id: i64, max_id: i64) -> String {
    format!("{id_field} >= {min_id} and {id_field} <= {max_id}")
}

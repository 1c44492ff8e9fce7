use std::num::NonZeroUsize;

use layer_harvest_core::{Endpoint, IdentifierManifest, ObjectId};
use serde_json::Value;
use url::Url;

use crate::error::ResolutionError;
use crate::fetch::Fetcher;

/// Reads layer capabilities and the identifier manifest, one request each.
pub struct ServiceResolver<'a> {
    fetcher: &'a dyn Fetcher,
}

impl<'a> ServiceResolver<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self { fetcher }
    }

    /// The server-advertised `maxRecordCount`.
    pub async fn resolve_page_size(
        &self,
        endpoint: &Endpoint,
    ) -> Result<NonZeroUsize, ResolutionError> {
        let url = endpoint.capabilities_url();
        let body = self.fetch_json(&url).await?;
        body.get("maxRecordCount")
            .and_then(Value::as_u64)
            .and_then(|max| usize::try_from(max).ok())
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| ResolutionError::MissingKey {
                url: url.to_string(),
                key: "maxRecordCount",
            })
    }

    /// The identifier field name and every identifier, sorted ascending.
    pub async fn resolve_manifest(
        &self,
        endpoint: &Endpoint,
    ) -> Result<IdentifierManifest, ResolutionError> {
        let url = endpoint.manifest_url();
        let body = self.fetch_json(&url).await?;

        let id_field = body
            .get("objectIdFieldName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ResolutionError::MissingKey {
                url: url.to_string(),
                key: "objectIdFieldName",
            })?;

        // An empty layer may answer with `null` instead of an empty list.
        let ids = match body.get("objectIds") {
            Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(Value::as_i64)
                .collect::<Option<Vec<ObjectId>>>()
                .ok_or_else(|| ResolutionError::MissingKey {
                    url: url.to_string(),
                    key: "objectIds",
                })?,
            _ => {
                return Err(ResolutionError::MissingKey {
                    url: url.to_string(),
                    key: "objectIds",
                })
            }
        };

        Ok(IdentifierManifest::from_unsorted(id_field, ids))
    }

    async fn fetch_json(&self, url: &Url) -> Result<Value, ResolutionError> {
        let reply = self
            .fetcher
            .get(url)
            .await
            .map_err(|source| ResolutionError::Transport {
                url: url.to_string(),
                source,
            })?;
        if !(200..=299).contains(&reply.status) {
            return Err(ResolutionError::HttpStatus {
                url: url.to_string(),
                status: reply.status,
            });
        }

        let body: Value =
            serde_json::from_slice(&reply.body).map_err(|source| ResolutionError::InvalidJson {
                url: url.to_string(),
                source,
            })?;
        if let Some(error) = body.get("error") {
            return Err(ResolutionError::ServerError {
                url: url.to_string(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unspecified")
                    .to_string(),
            });
        }
        Ok(body)
    }
}

use serde::Deserialize;
use serde_json::Value;

use crate::error::ConversionError;
use crate::records::{ConvertedRecordSet, FieldDef, GeometryKind, Record, RecordSchema};

/// Turns one staged payload into typed records of the target geometry.
///
/// Platform-specific converters plug in here; a failure aborts the merge.
pub trait Converter: Send + Sync {
    fn convert(
        &self,
        payload: &[u8],
        geometry: GeometryKind,
    ) -> Result<ConvertedRecordSet, ConversionError>;
}

/// Reads the feature service JSON query response directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureJsonConverter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeaturePayload {
    #[serde(default)]
    geometry_type: Option<String>,
    #[serde(default)]
    spatial_reference: Option<Value>,
    #[serde(default)]
    fields: Vec<FieldDef>,
    #[serde(default)]
    features: Option<Vec<Record>>,
    #[serde(default)]
    error: Option<Value>,
}

impl Converter for FeatureJsonConverter {
    fn convert(
        &self,
        payload: &[u8],
        geometry: GeometryKind,
    ) -> Result<ConvertedRecordSet, ConversionError> {
        let parsed: FeaturePayload = serde_json::from_slice(payload)?;
        if let Some(error) = parsed.error {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ConversionError::ServerError(message));
        }
        if let Some(found) = parsed.geometry_type {
            if GeometryKind::from_service_name(&found) != Some(geometry) {
                return Err(ConversionError::GeometryMismatch {
                    expected: geometry,
                    found,
                });
            }
        }
        let records = parsed
            .features
            .ok_or(ConversionError::MissingMember("features"))?;

        Ok(ConvertedRecordSet {
            schema: RecordSchema {
                geometry,
                fields: parsed.fields,
                spatial_reference: parsed.spatial_reference,
            },
            records,
        })
    }
}

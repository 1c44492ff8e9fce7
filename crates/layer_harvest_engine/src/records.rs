use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geometry type of a feature layer, named as the service names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Multipoint,
    Polyline,
    Polygon,
    Envelope,
}

impl GeometryKind {
    /// The `geometryType` string used in service payloads.
    pub fn service_name(self) -> &'static str {
        match self {
            GeometryKind::Point => "esriGeometryPoint",
            GeometryKind::Multipoint => "esriGeometryMultipoint",
            GeometryKind::Polyline => "esriGeometryPolyline",
            GeometryKind::Polygon => "esriGeometryPolygon",
            GeometryKind::Envelope => "esriGeometryEnvelope",
        }
    }

    pub fn from_service_name(name: &str) -> Option<Self> {
        [
            GeometryKind::Point,
            GeometryKind::Multipoint,
            GeometryKind::Polyline,
            GeometryKind::Polygon,
            GeometryKind::Envelope,
        ]
        .into_iter()
        .find(|kind| kind.service_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Shape shared by every record of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub geometry: GeometryKind,
    pub fields: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_reference: Option<Value>,
}

impl RecordSchema {
    /// Schema of a layer with no records: geometry only.
    pub fn empty(geometry: GeometryKind) -> Self {
        Self {
            geometry,
            fields: Vec::new(),
            spatial_reference: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

/// Typed records converted from one staged payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedRecordSet {
    pub schema: RecordSchema,
    pub records: Vec<Record>,
}

mod support;

use layer_harvest_engine::{ConversionError, Converter, FeatureJsonConverter, GeometryKind};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::feature_payload;

#[test]
fn converts_features_with_schema() {
    let payload = serde_json::to_vec(&feature_payload([4, 5])).unwrap();

    let set = FeatureJsonConverter
        .convert(&payload, GeometryKind::Polygon)
        .unwrap();

    assert_eq!(set.schema.geometry, GeometryKind::Polygon);
    let names: Vec<&str> = set.schema.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["OBJECTID", "NAME"]);
    assert_eq!(set.schema.fields[1].alias.as_deref(), Some("Name"));
    assert_eq!(
        set.schema.spatial_reference,
        Some(json!({"wkid": 102100, "latestWkid": 3857}))
    );
    assert_eq!(set.records.len(), 2);
    assert_eq!(set.records[0].attributes["OBJECTID"], json!(4));
    assert!(set.records[1].geometry.is_some());
}

#[test]
fn server_error_payload_fails_conversion() {
    let payload = br#"{"error":{"code":500,"message":"Error performing query operation","details":[]}}"#;

    let err = FeatureJsonConverter
        .convert(payload, GeometryKind::Polygon)
        .unwrap_err();

    match err {
        ConversionError::ServerError(message) => {
            assert_eq!(message, "Error performing query operation")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn geometry_kind_must_match_target() {
    let mut payload = feature_payload([1]);
    payload["geometryType"] = json!("esriGeometryPoint");
    let bytes = serde_json::to_vec(&payload).unwrap();

    let err = FeatureJsonConverter
        .convert(&bytes, GeometryKind::Polygon)
        .unwrap_err();

    assert!(matches!(
        err,
        ConversionError::GeometryMismatch {
            expected: GeometryKind::Polygon,
            ..
        }
    ));
}

#[test]
fn truncated_or_featureless_payloads_fail() {
    let err = FeatureJsonConverter
        .convert(b"{\"features\": [", GeometryKind::Polygon)
        .unwrap_err();
    assert!(matches!(err, ConversionError::InvalidJson(_)));

    let err = FeatureJsonConverter
        .convert(b"{\"objectIdFieldName\": \"OBJECTID\"}", GeometryKind::Polygon)
        .unwrap_err();
    assert!(matches!(err, ConversionError::MissingMember("features")));
}

#[test]
fn geometry_names_round_trip() {
    for kind in [
        GeometryKind::Point,
        GeometryKind::Multipoint,
        GeometryKind::Polyline,
        GeometryKind::Polygon,
        GeometryKind::Envelope,
    ] {
        assert_eq!(GeometryKind::from_service_name(kind.service_name()), Some(kind));
    }
    assert_eq!(GeometryKind::from_service_name("esriGeometryMesh"), None);
}

mod support;

use layer_harvest_core::Endpoint;
use layer_harvest_engine::{FetchSettings, ReqwestFetcher, ResolutionError, ServiceResolver};
use serde_json::json;
use support::{layer_url, mount_layer, LAYER_PATH};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> ReqwestFetcher {
    ReqwestFetcher::new(FetchSettings::default()).unwrap()
}

#[tokio::test]
async fn reads_max_record_count_and_sorted_manifest() {
    let server = MockServer::start().await;
    mount_layer(&server, 2000, 5).await;
    let endpoint = Endpoint::parse(&layer_url(&server)).unwrap();
    let fetcher = fetcher();
    let resolver = ServiceResolver::new(&fetcher);

    let page_size = resolver.resolve_page_size(&endpoint).await.unwrap();
    assert_eq!(page_size.get(), 2000);

    let manifest = resolver.resolve_manifest(&endpoint).await.unwrap();
    assert_eq!(manifest.id_field(), "OBJECTID");
    assert_eq!(manifest.ids(), &[1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn missing_max_record_count_is_a_resolution_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LAYER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Parcels"})))
        .mount(&server)
        .await;
    let endpoint = Endpoint::parse(&layer_url(&server)).unwrap();
    let fetcher = fetcher();

    let err = ServiceResolver::new(&fetcher)
        .resolve_page_size(&endpoint)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolutionError::MissingKey {
            key: "maxRecordCount",
            ..
        }
    ));
}

#[tokio::test]
async fn html_answer_is_not_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{LAYER_PATH}/query")))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>login</html>", "text/html"))
        .mount(&server)
        .await;
    let endpoint = Endpoint::parse(&layer_url(&server)).unwrap();
    let fetcher = fetcher();

    let err = ServiceResolver::new(&fetcher)
        .resolve_manifest(&endpoint)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolutionError::InvalidJson { .. }));
}

#[tokio::test]
async fn null_identifier_list_means_empty_layer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{LAYER_PATH}/query")))
        .and(query_param("returnIdsOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectIdFieldName": "FID",
            "objectIds": null
        })))
        .mount(&server)
        .await;
    let endpoint = Endpoint::parse(&layer_url(&server)).unwrap();
    let fetcher = fetcher();

    let manifest = ServiceResolver::new(&fetcher)
        .resolve_manifest(&endpoint)
        .await
        .unwrap();
    assert_eq!(manifest.id_field(), "FID");
    assert!(manifest.is_empty());
}

#[tokio::test]
async fn error_status_and_error_body_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LAYER_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{LAYER_PATH}/query")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"code": 499, "message": "Token Required", "details": []}
        })))
        .mount(&server)
        .await;
    let endpoint = Endpoint::parse(&layer_url(&server)).unwrap();
    let fetcher = fetcher();
    let resolver = ServiceResolver::new(&fetcher);

    let err = resolver.resolve_page_size(&endpoint).await.unwrap_err();
    assert!(matches!(err, ResolutionError::HttpStatus { status: 503, .. }));

    let err = resolver.resolve_manifest(&endpoint).await.unwrap_err();
    match err {
        ResolutionError::ServerError { message, .. } => assert_eq!(message, "Token Required"),
        other => panic!("unexpected error: {other}"),
    }
}

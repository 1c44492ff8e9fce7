#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use layer_harvest_engine::{Clock, FetchError, Fetcher, HarvestEvent, HttpReply, ProgressSink};
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const LAYER_PATH: &str = "/arcgis/rest/services/Parcels/FeatureServer/0";

/// Replays canned replies in order and records every requested URL.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: Mutex<VecDeque<Result<HttpReply, FetchError>>>,
    requests: Mutex<Vec<Url>>,
}

impl ScriptedFetcher {
    pub fn new(replies: Vec<Result<HttpReply, FetchError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Url> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &Url) -> Result<HttpReply, FetchError> {
        self.requests.lock().unwrap().push(url.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("more requests than scripted replies")
    }
}

pub fn reply(status: u16, body: &[u8]) -> Result<HttpReply, FetchError> {
    Ok(HttpReply {
        status,
        body: body.to_vec(),
    })
}

/// Advances virtual time on every sleep instead of waiting.
pub struct RecordingClock {
    start: Instant,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> Instant {
        self.start + self.sleeps.lock().unwrap().iter().sum::<Duration>()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Arc<Mutex<Vec<HarvestEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn polygon_fields() -> Value {
    json!([
        {"name": "OBJECTID", "type": "esriFieldTypeOID", "alias": "OBJECTID"},
        {"name": "NAME", "type": "esriFieldTypeString", "alias": "Name", "length": 50}
    ])
}

/// A query response holding one square polygon per identifier.
pub fn feature_payload(ids: impl IntoIterator<Item = i64>) -> Value {
    let features: Vec<Value> = ids
        .into_iter()
        .map(|id| {
            let x = id as f64;
            json!({
                "attributes": {"OBJECTID": id, "NAME": format!("parcel {id}")},
                "geometry": {"rings": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 0.0]]]}
            })
        })
        .collect();
    json!({
        "objectIdFieldName": "OBJECTID",
        "geometryType": "esriGeometryPolygon",
        "spatialReference": {"wkid": 102100, "latestWkid": 3857},
        "fields": polygon_fields(),
        "features": features
    })
}

/// Answers range queries from a sequential identifier space `1..=total`.
pub struct RangeResponder {
    pub total: i64,
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let filter = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "where")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        match parse_range(&filter) {
            Some((min, max)) => {
                let ids = (min.max(1)..=max.min(self.total)).collect::<Vec<_>>();
                ResponseTemplate::new(200).set_body_json(feature_payload(ids))
            }
            None => ResponseTemplate::new(400),
        }
    }
}

/// `OBJECTID >= 5 and OBJECTID <= 9` -> `(5, 9)`.
pub fn parse_range(filter: &str) -> Option<(i64, i64)> {
    let tokens: Vec<&str> = filter.split_whitespace().collect();
    match tokens.as_slice() {
        [_, ">=", min, "and", _, "<=", max] => Some((min.parse().ok()?, max.parse().ok()?)),
        _ => None,
    }
}

/// Mounts capabilities, manifest and range query handlers for a layer of
/// `total` sequential identifiers.
pub async fn mount_layer(server: &MockServer, max_record_count: usize, total: i64) {
    Mock::given(method("GET"))
        .and(path(LAYER_PATH))
        .and(query_param("f", "pjson"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "currentVersion": 10.91,
            "name": "Parcels",
            "type": "Feature Layer",
            "maxRecordCount": max_record_count
        })))
        .mount(server)
        .await;

    // Deliberately unsorted, as servers may return them.
    let mut ids: Vec<i64> = (1..=total).collect();
    ids.reverse();
    Mock::given(method("GET"))
        .and(path(format!("{LAYER_PATH}/query")))
        .and(query_param("returnIdsOnly", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectIdFieldName": "OBJECTID",
            "objectIds": ids
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{LAYER_PATH}/query")))
        .and(query_param("returnGeometry", "true"))
        .respond_with(RangeResponder { total })
        .mount(server)
        .await;
}

pub fn layer_url(server: &MockServer) -> String {
    format!("{}{LAYER_PATH}", server.uri())
}

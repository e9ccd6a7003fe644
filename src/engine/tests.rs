//! Tests for engine module

use super::*;
use crate::settings::AuthenticationMethod;
use crate::types::{InstanceInfo, TimeRange};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine() -> QueryEngine {
    QueryEngine::new(Settings::default()).unwrap()
}

fn data_query(ref_id: &str, query: Value) -> DataQuery {
    DataQuery::new(ref_id, query.to_string())
}

fn custom(response: &DataResponse) -> &CustomMeta {
    response.frame().unwrap().meta.custom.as_ref().unwrap()
}

// ============================================================================
// Envelope Tests
// ============================================================================

#[test]
fn test_data_query_from_value() {
    let query = DataQuery::from_value(&json!({"refId": "B", "url": "https://x/"}));
    assert_eq!(query.ref_id, "B");
    assert!(query.json.contains("https://x/"));

    let unnamed = DataQuery::from_value(&json!({"url": "https://x/"}));
    assert_eq!(unnamed.ref_id, "");
}

#[test]
fn test_failed_response_has_one_empty_frame() {
    let response = DataResponse::failed("A", Error::MissingAllowList);
    assert_eq!(response.frames.len(), 1);
    assert_eq!(response.frame().unwrap().num_fields(), 0);
    assert!(!response.is_ok());

    let rendered = response.to_json().unwrap();
    assert_eq!(
        rendered["error"],
        "Datasource is missing allowed hosts/URLs. Configure it in the datasource settings page."
    );
    assert_eq!(rendered["frames"][0]["name"], "A");
}

#[test]
fn test_query_counter() {
    let counter = QueryCounter::new();
    let labels = QueryLabels {
        query_type: "json".to_string(),
        source: "url".to_string(),
        ..Default::default()
    };
    counter.record_query(&labels);
    counter.record_query(&labels);
    counter.record_query(&QueryLabels::default());

    assert_eq!(counter.count(&labels), 2);
    assert_eq!(counter.total(), 3);
    assert_eq!(counter.snapshot().len(), 2);
}

#[test]
fn test_query_labels() {
    let settings = Settings {
        authentication_method: AuthenticationMethod::OAuth2,
        ..Default::default()
    };
    let ctx = RequestContext::new().with_instance(InstanceInfo {
        id: 3,
        uid: "u".to_string(),
        name: "prod".to_string(),
    });
    let query = Query::from_inline("A", crate::query::QueryType::Csv, "a,b");

    let labels = QueryLabels::new(&ctx, &query, &settings);
    assert_eq!(labels.instance_id, "3");
    assert_eq!(labels.instance_name, "prod");
    assert_eq!(labels.query_type, "csv");
    assert_eq!(labels.source, "inline");
    assert_eq!(labels.auth_type, "oauth2 client_credentials");
}

// ============================================================================
// Query Flow Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_query_fails_alone() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/ok", mock_server.uri());
    let request = QueryDataRequest::new(vec![
        data_query("A", json!({"source": "url", "url": url})),
        DataQuery::new("B", "{not json"),
        data_query("C", json!({"source": "url", "url": url})),
    ]);

    let response = engine().query_data(&request).await;

    assert_eq!(response.len(), 3);
    assert!(response.get("A").unwrap().is_ok());
    assert!(response.get("C").unwrap().is_ok());

    let failed = response.get("B").unwrap();
    assert!(matches!(failed.error, Some(Error::QueryDecode { .. })));
    assert_eq!(failed.frames.len(), 1);
    assert_eq!(response.error_count(), 1);
}

#[tokio::test]
async fn test_missing_allow_list_skips_network() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = Settings {
        authentication_method: AuthenticationMethod::BearerToken,
        bearer_token: "t".to_string(),
        ..Default::default()
    };
    let counter = Arc::new(QueryCounter::new());
    let engine = QueryEngine::new(settings)
        .unwrap()
        .with_metrics(counter.clone());

    let response = engine
        .query(
            &data_query("A", json!({"source": "url", "url": mock_server.uri()})),
            &RequestContext::new(),
        )
        .await;

    assert!(matches!(response.error, Some(Error::MissingAllowList)));
    assert_eq!(counter.total(), 0);

    let inline = engine
        .query(
            &data_query("B", json!({"source": "inline", "data": "a,b"})),
            &RequestContext::new(),
        )
        .await;
    assert!(inline.is_ok());
    assert_eq!(counter.total(), 1);
}

#[tokio::test]
async fn test_upstream_error_is_recorded_in_meta() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let response = engine()
        .query(
            &data_query("A", json!({"source": "url", "url": mock_server.uri()})),
            &RequestContext::new(),
        )
        .await;

    assert!(response.is_ok());
    let meta = custom(&response);
    assert_eq!(meta.response_code_from_server, 500);
    assert_eq!(meta.error, "500 Internal Server Error");
    assert_eq!(
        response.frame().unwrap().meta.executed_query_string,
        format!("{}/", mock_server.uri())
    );
}

#[tokio::test]
async fn test_json_backend_root_selector() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"a": {"rows": [{"x": 1}, {"x": 2}], "c": 3}})),
        )
        .mount(&mock_server)
        .await;

    let query = |selector: &str| {
        data_query(
            "A",
            json!({
                "source": "url",
                "type": "json-backend",
                "url": format!("{}/data", mock_server.uri()),
                "rootSelector": selector,
            }),
        )
    };
    let engine = engine();
    let ctx = RequestContext::new();

    let rows = engine.query(&query("a.rows"), &ctx).await;
    let frame = rows.frame().unwrap();
    assert_eq!(frame.field_names(), vec!["x"]);
    assert_eq!(frame.num_rows(), 2);
    assert_eq!(custom(&rows).data, json!([{"x": 1}, {"x": 2}]));

    let scalar = engine.query(&query("a.c"), &ctx).await;
    assert_eq!(scalar.frame().unwrap().field_names(), vec!["value"]);

    let missing = engine.query(&query("a.nope"), &ctx).await;
    assert!(missing.is_ok());
    assert_eq!(missing.frame().unwrap().num_fields(), 0);
    assert_eq!(custom(&missing).error, "error parsing json root data");
}

#[tokio::test]
async fn test_plain_json_is_not_framed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"x": 1}])))
        .mount(&mock_server)
        .await;

    let response = engine()
        .query(
            &data_query("A", json!({"source": "url", "type": "json", "url": mock_server.uri()})),
            &RequestContext::new(),
        )
        .await;

    assert_eq!(response.frame().unwrap().num_fields(), 0);
    let meta = custom(&response);
    assert_eq!(meta.data, json!([{"x": 1}]));
    assert_eq!(meta.response_code_from_server, 200);
    assert_eq!(meta.error, "");
}

#[tokio::test]
async fn test_macros_are_resolved_before_fetch() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("from", "1704067200000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let range = TimeRange::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
    );
    let query = data_query(
        "A",
        json!({"source": "url", "url": format!("{}/?from=${{__from}}", mock_server.uri())}),
    )
    .with_time_range(range);

    let response = engine().query(&query, &RequestContext::new()).await;
    assert_eq!(custom(&response).query.url, format!("{}/?from=1704067200000", mock_server.uri()));
}

#[tokio::test]
async fn test_bad_macro_fails_query() {
    let response = engine()
        .query(
            &data_query("A", json!({"source": "inline", "data": "${__from:date:%}"})),
            &RequestContext::new(),
        )
        .await;
    assert!(response.is_ok());

    let response = engine()
        .query(
            &data_query("A", json!({"source": "url", "url": "https://x.example.com/${__from:date:%}"})),
            &RequestContext::new(),
        )
        .await;
    assert!(matches!(response.error, Some(Error::Interpolation { .. })));
}

#[tokio::test]
async fn test_inline_json_backend() {
    let response = engine()
        .query(
            &data_query(
                "A",
                json!({
                    "source": "inline",
                    "type": "json-backend",
                    "data": r#"{"items": [{"n": 1}, {"n": 2}, {"n": 3}]}"#,
                    "rootSelector": "items",
                }),
            ),
            &RequestContext::new(),
        )
        .await;

    let frame = response.frame().unwrap();
    assert_eq!(frame.num_rows(), 3);
    assert_eq!(frame.meta.executed_query_string, NOT_AVAILABLE_QUERY_STRING);
    assert_eq!(
        custom(&response).data,
        json!(r#"{"items": [{"n": 1}, {"n": 2}, {"n": 3}]}"#)
    );
}

#[tokio::test]
async fn test_inline_invalid_json_recorded() {
    let response = engine()
        .query(
            &data_query(
                "A",
                json!({"source": "inline", "type": "json-backend", "data": "nope", "rootSelector": "a"}),
            ),
            &RequestContext::new(),
        )
        .await;

    assert!(response.is_ok());
    assert_eq!(custom(&response).error, "error parsing json root data");
}

#[tokio::test]
async fn test_other_source_metadata_only() {
    let response = engine()
        .query(
            &data_query("A", json!({"source": "reference", "url": "https://x/"})),
            &RequestContext::new(),
        )
        .await;

    let frame = response.frame().unwrap();
    assert_eq!(frame.num_fields(), 0);
    assert_eq!(frame.meta.executed_query_string, NOT_AVAILABLE_QUERY_STRING);
    assert_eq!(custom(&response).response_code_from_server, 0);
}

#[tokio::test]
async fn test_missing_source_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = Settings {
        authentication_method: AuthenticationMethod::BasicAuth,
        basic_auth_user: "user".to_string(),
        ..Default::default()
    };
    let response = QueryEngine::new(settings)
        .unwrap()
        .query(
            &data_query("A", json!({"url": mock_server.uri()})),
            &RequestContext::new(),
        )
        .await;

    assert!(response.is_ok());
    let frame = response.frame().unwrap();
    assert_eq!(frame.num_fields(), 0);
    assert_eq!(frame.meta.executed_query_string, NOT_AVAILABLE_QUERY_STRING);
}

#[tokio::test]
async fn test_ref_id_from_envelope_wins() {
    let response = engine()
        .query(
            &data_query("Z", json!({"refId": "A", "source": "inline", "data": ""})),
            &RequestContext::new(),
        )
        .await;
    assert_eq!(response.frame().unwrap().name, "Z");
    assert_eq!(custom(&response).query.ref_id, "Z");
}

// ============================================================================
// Injection Tests
// ============================================================================

struct UpperInterpolator;

impl Interpolator for UpperInterpolator {
    fn interpolate(&self, mut query: Query, _range: &TimeRange) -> Result<Query> {
        query.data = query.data.to_uppercase();
        Ok(query)
    }
}

struct FixedFramer;

impl Framer for FixedFramer {
    fn to_frame(&self, ref_id: &str, _value: &JsonValue, _options: &FramerOptions) -> Result<Frame> {
        ArrowFramer::new().to_frame(ref_id, &json!([{"fixed": true}]), &FramerOptions::default())
    }
}

#[tokio::test]
async fn test_injected_interpolator_and_framer() {
    let engine = engine()
        .with_interpolator(Arc::new(UpperInterpolator))
        .with_framer(Arc::new(FixedFramer));

    let response = engine
        .query(
            &data_query("A", json!({"source": "inline", "type": "json-backend", "data": "[1]"})),
            &RequestContext::new(),
        )
        .await;

    assert_eq!(response.frame().unwrap().field_names(), vec!["fixed"]);
    assert_eq!(custom(&response).query.data, "[1]");

    let response = engine
        .query(
            &data_query("B", json!({"source": "inline", "data": "abc"})),
            &RequestContext::new(),
        )
        .await;
    assert_eq!(custom(&response).data, json!("ABC"));
}

// ============================================================================
// Health Tests
// ============================================================================

#[test]
fn test_check_health() {
    assert!(check_health(&Settings::default()).is_ok());

    let missing = check_health(&Settings {
        authentication_method: AuthenticationMethod::BasicAuth,
        ..Default::default()
    });
    assert_eq!(missing.status, HealthStatus::Error);
    assert_eq!(missing.message, HEALTH_MISSING_ALLOWED_HOSTS);

    let bad_tls = check_health(&Settings {
        tls_client_auth: true,
        ..Default::default()
    });
    assert!(!bad_tls.is_ok());
    assert_eq!(bad_tls.message, "invalid Client cert or key");
}

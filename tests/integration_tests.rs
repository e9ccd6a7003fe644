//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: settings + query JSON → HTTP request →
//! root selection → Arrow frame with metadata

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::io::Write;
use urlframe::cli::QueryBatch;
use urlframe::engine::{DataQuery, QueryDataRequest, QueryEngine};
use urlframe::{Error, RequestContext, Settings};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query(ref_id: &str, value: Value) -> DataQuery {
    DataQuery::new(ref_id, value.to_string())
}

async fn run(settings: Settings, queries: Vec<DataQuery>) -> urlframe::QueryDataResponse {
    QueryEngine::new(settings)
        .unwrap()
        .query_data(&QueryDataRequest::new(queries))
        .await
}

fn meta(response: &urlframe::QueryDataResponse, ref_id: &str) -> Value {
    let frame = response.get(ref_id).unwrap().frame().unwrap();
    frame.to_json().unwrap()["meta"].clone()
}

// ============================================================================
// Batch Isolation Tests
// ============================================================================

#[tokio::test]
async fn test_batch_with_malformed_middle_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                {"id": 1, "name": "Alice"},
                {"id": 2, "name": "Bob"}
            ]
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let url = format!("{}/api/users", mock_server.uri());
    let response = run(
        Settings::default(),
        vec![
            query("A", json!({"source": "url", "type": "json-backend", "url": url, "rootSelector": "users"})),
            DataQuery::new("B", r#"{"source": "url", "type": "json", "url": "#),
            query("C", json!({"source": "url", "type": "json", "url": url})),
        ],
    )
    .await;

    assert_eq!(response.len(), 3);

    let a = response.get("A").unwrap();
    assert!(a.is_ok());
    let frame = a.frame().unwrap();
    assert_eq!(frame.field_names(), vec!["id", "name"]);
    assert_eq!(frame.num_rows(), 2);

    let b = response.get("B").unwrap();
    assert!(matches!(b.error, Some(Error::QueryDecode { .. })));
    assert_eq!(b.frames.len(), 1);

    let c = meta(&response, "C");
    assert_eq!(c["custom"]["responseCodeFromServer"], 200);
    assert_eq!(c["custom"]["data"]["users"][1]["name"], "Bob");
}

#[tokio::test]
async fn test_upstream_500_is_metadata_not_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let response = run(
        Settings::default(),
        vec![query("A", json!({"source": "url", "url": format!("{}/x", mock_server.uri())}))],
    )
    .await;

    let a = response.get("A").unwrap();
    assert!(a.is_ok());
    let meta = meta(&response, "A");
    assert_eq!(meta["custom"]["responseCodeFromServer"], 500);
    assert_eq!(meta["custom"]["error"], "500 Internal Server Error");
    assert!(meta["custom"]["duration"].as_u64().unwrap() > 0);
}

// ============================================================================
// Security Tests
// ============================================================================

#[tokio::test]
async fn test_missing_allow_list_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = Settings::parse(
        r"
authenticationMethod: basicAuth
basicAuthUser: user
basicAuthPassword: pass
",
    )
    .unwrap();

    let response = run(
        settings,
        vec![query("A", json!({"source": "url", "url": mock_server.uri()}))],
    )
    .await;

    let a = response.get("A").unwrap();
    assert_eq!(
        a.error.as_ref().unwrap().to_string(),
        "Datasource is missing allowed hosts/URLs. Configure it in the datasource settings page."
    );
    assert_eq!(a.frame().unwrap().num_fields(), 0);
}

#[tokio::test]
async fn test_url_outside_allow_list_is_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let settings = Settings {
        allowed_hosts: vec!["https://api.example.com".to_string()],
        ..Default::default()
    };

    let response = run(
        settings,
        vec![query("A", json!({"source": "url", "url": mock_server.uri()}))],
    )
    .await;
    let meta = meta(&response, "A");
    assert_eq!(meta["custom"]["responseCodeFromServer"], 401);
    assert_eq!(
        meta["custom"]["error"],
        "requested URL is not allowed. To allow this URL, update the datasource config URL -> Allowed Hosts section"
    );
}

#[tokio::test]
async fn test_secrets_sent_but_redacted_in_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("key", "s3cr3t"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = Settings::parse(&format!(
        r"
authenticationMethod: basicAuth
basicAuthUser: user
basicAuthPassword: pass
allowedHosts: ['{}']
secureQueryFields:
  token: s3cr3t
",
        mock_server.uri()
    ))
    .unwrap();

    let response = run(
        settings,
        vec![query(
            "A",
            json!({"source": "url", "url": format!("{}/search?key=${{__qs.token}}", mock_server.uri())}),
        )],
    )
    .await;

    let meta = meta(&response, "A");
    let executed = meta["executedQueryString"].as_str().unwrap();
    assert!(executed.contains("key=xxxxxxxx"));
    assert!(!meta.to_string().contains("s3cr3t"));
    assert!(!meta.to_string().contains("dXNlcjpwYXNz"));
}

// ============================================================================
// Query Type Tests
// ============================================================================

#[tokio::test]
async fn test_graphql_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"query": "{ users { id } }"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"users": [{"id": 1}]}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = run(
        Settings::default(),
        vec![query(
            "G",
            json!({
                "source": "url",
                "type": "graphql",
                "url": format!("{}/graphql", mock_server.uri()),
                "url_options": {"method": "POST", "data": "{ users { id } }"},
            }),
        )],
    )
    .await;

    let meta = meta(&response, "G");
    assert_eq!(meta["custom"]["data"]["data"]["users"][0]["id"], 1);
    assert_eq!(meta["custom"]["error"], "");
}

#[tokio::test]
async fn test_root_selectors_pick_subtrees() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": {"b": 1, "c": 2}})))
        .mount(&mock_server)
        .await;

    let selected = |ref_id: &str, selector: &str| {
        query(
            ref_id,
            json!({"source": "url", "type": "json-backend", "url": mock_server.uri(), "rootSelector": selector}),
        )
    };
    let response = run(
        Settings::default(),
        vec![
            selected("B", "a.b"),
            selected("C", "a.c"),
            selected("J", "$.a"),
        ],
    )
    .await;

    assert_eq!(meta(&response, "B")["custom"]["data"], json!(1));
    assert_eq!(meta(&response, "C")["custom"]["data"], json!(2));

    let j = response.get("J").unwrap().frame().unwrap();
    assert_eq!(j.field_names(), vec!["b", "c"]);
    assert_eq!(j.num_rows(), 1);
}

#[tokio::test]
async fn test_inline_json_backend() {
    let response = run(
        Settings::default(),
        vec![query(
            "I",
            json!({
                "source": "inline",
                "type": "json-backend",
                "data": r#"{"rows": [{"t": "2024-01-01T00:00:00Z", "v": "1.5"}]}"#,
                "rootSelector": "rows",
                "columns": [
                    {"selector": "t", "text": "Time", "type": "timestamp"},
                    {"selector": "v", "text": "Value", "type": "number"}
                ],
            }),
        )],
    )
    .await;

    let frame = response.get("I").unwrap().frame().unwrap();
    let rendered = frame.to_json().unwrap();
    assert_eq!(
        rendered["rows"],
        json!([{"Time": "2024-01-01T00:00:00.000Z", "Value": 1.5}])
    );
    assert_eq!(
        rendered["meta"]["executedQueryString"],
        "This feature is not available for this type of query yet"
    );
}

// ============================================================================
// OAuth2 Tests
// ============================================================================

#[tokio::test]
async fn test_oauth2_client_credentials_flow() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"x": 1}])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let settings = Settings::parse(&format!(
        r#"{{
            "authenticationMethod": "oauth2",
            "oauth2": {{
                "oauth2Type": "client_credentials",
                "clientId": "id",
                "clientSecret": "secret",
                "tokenUrl": "{uri}/token"
            }},
            "allowedHosts": ["{uri}"]
        }}"#,
        uri = mock_server.uri()
    ))
    .unwrap();

    let url = format!("{}/data", mock_server.uri());
    let response = run(
        settings,
        vec![
            query("A", json!({"source": "url", "type": "json-backend", "url": url})),
            query("B", json!({"source": "url", "type": "json-backend", "url": url})),
        ],
    )
    .await;

    for ref_id in ["A", "B"] {
        let frame = response.get(ref_id).unwrap().frame().unwrap();
        assert_eq!(frame.num_rows(), 1);
    }
}

// ============================================================================
// Batch Document Tests
// ============================================================================

#[tokio::test]
async fn test_batch_file_with_headers_and_range() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("from", "1704067200"))
        .and(header("X-Trace", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "queries": [{{"refId": "A", "source": "url", "url": "{}/?from=$__unixEpochFrom()"}}],
            "range": {{"from": "2024-01-01T00:00:00Z", "to": "2024-01-02T00:00:00Z"}},
            "headers": {{"X-Trace": "t1"}}
        }}"#,
        mock_server.uri()
    )
    .unwrap();

    let request = QueryBatch::from_file(file.path()).unwrap().into_request();
    assert_eq!(request.context.headers.len(), 1);

    let response = QueryEngine::new(Settings::default())
        .unwrap()
        .query_data(&request)
        .await;
    assert_eq!(meta(&response, "A")["custom"]["responseCodeFromServer"], 200);
}

#[tokio::test]
async fn test_caller_headers_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("X-Request-Id", "r1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = QueryDataRequest::new(vec![query("A", json!({"source": "url", "url": mock_server.uri()}))])
        .with_context(RequestContext::new().header("X-Request-Id", "r1"));

    let response = QueryEngine::new(Settings::default())
        .unwrap()
        .query_data(&request)
        .await;
    assert!(response.get("A").unwrap().is_ok());
}

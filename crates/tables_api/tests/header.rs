use tables_api::headers::{
    build_headers, default_user_agent, to_header_map, HEADER_ACCEPT, HEADER_CONTENT_TYPE,
    HEADER_USER_AGENT, JSON_CONTENT_TYPE,
};
use tables_api::{TablesConfig, TransportError, STREAM_RESPONSE_HEADERS};

#[test]
fn header_map_contains_json_defaults() {
    let headers = build_headers(&TablesConfig::default());
    assert_eq!(
        headers.get(HEADER_CONTENT_TYPE).expect("content-type"),
        JSON_CONTENT_TYPE
    );
    assert_eq!(headers.get(HEADER_ACCEPT).expect("accept"), JSON_CONTENT_TYPE);
    assert_eq!(
        headers.get(HEADER_USER_AGENT).expect("user-agent"),
        &default_user_agent()
    );
}

#[test]
fn header_map_merges_extra_headers_lowercased() {
    let config = TablesConfig::default()
        .with_user_agent("tables-test/1")
        .insert_header("X-Api-Key", " secret ")
        .insert_header("Accept", "application/x-ndjson")
        .insert_header("  ", "ignored");

    let headers = build_headers(&config);
    assert_eq!(headers.get("x-api-key").expect("api key"), "secret");
    assert_eq!(
        headers.get(HEADER_ACCEPT).expect("accept"),
        "application/x-ndjson"
    );
    assert_eq!(
        headers.get(HEADER_USER_AGENT).expect("user-agent"),
        "tables-test/1"
    );
    assert_eq!(headers.len(), 4);
}

#[test]
fn header_map_rejects_invalid_header_values() {
    let config = TablesConfig::default().insert_header("x-bad", "line\nbreak");
    let error = to_header_map(&build_headers(&config)).expect_err("invalid header");
    assert!(matches!(error, TransportError::InvalidHeader { name } if name == "x-bad"));
}

#[test]
fn stream_response_headers_declare_chunked_json() {
    assert_eq!(
        STREAM_RESPONSE_HEADERS,
        [
            ("Content-Type", "application/json"),
            ("Transfer-Encoding", "chunked"),
        ]
    );
}

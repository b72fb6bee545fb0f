use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use pretty_assertions::assert_eq;

use ahd_client::http::HttpEventSource;
use ahd_core::auth::{classify_app_error, AuthErrorKind};
use ahd_core::source::{list_incidents, EventQuery, EventSource};

/// Serve exactly one canned response on an ephemeral port.
/// The handle yields the raw request (head and body) that was received.
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("read line");
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap_or(0);
            }
            let done = line == "\r\n" || line.is_empty();
            head.push_str(&line);
            if done {
                break;
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("read body");
        head.push_str(&String::from_utf8_lossy(&body));

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).expect("write");
        head
    });

    (base, handle)
}

const EVENTS_BODY: &str = r#"[
  {
    "arn": "arn:aws:health:us-east-1::event/EC2/AWS_EC2_OPERATIONAL_ISSUE/abc",
    "service": "EC2",
    "eventTypeCode": "AWS_EC2_OPERATIONAL_ISSUE",
    "eventTypeCategory": "issue",
    "region": "us-east-1",
    "statusCode": "open",
    "lastUpdatedTime": "2024-11-30T11:30:00Z",
    "actionability": "ACTION_REQUIRED",
    "environment": "PRD",
    "accountId": "111122223333"
  }
]"#;

#[test]
fn get_events_sends_query_and_token() {
    let (base, handle) = serve_once("200 OK", EVENTS_BODY);
    let client = HttpEventSource::new(&base).expect("client").with_token("tok-123");

    let query = EventQuery {
        event_status_codes: vec!["open".to_string()],
        services: vec!["EC2".to_string()],
        max_results: Some(25),
        ..Default::default()
    };
    let events = client.get_events(&query).expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].service.as_deref(), Some("EC2"));

    let request = handle.join().expect("server");
    let request_line = request.lines().next().unwrap_or_default();
    assert!(request_line.starts_with("GET /events?"));
    assert!(request_line.contains("maxResults=25"));
    assert!(request_line.contains("eventStatusCodes=open"));
    assert!(request_line.contains("services=EC2"));
    assert!(request.contains("Authorization: Bearer tok-123") || request.contains("authorization: Bearer tok-123"));
}

#[test]
fn listed_events_flow_through_ingest() {
    let (base, handle) = serve_once("200 OK", EVENTS_BODY);
    let client = HttpEventSource::new(&base).expect("client");
    let incidents = list_incidents(&client, 100).expect("incidents");
    handle.join().expect("server");

    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].title, "EC2 operational issue");
    assert_eq!(incidents[0].account_id.as_deref(), Some("111122223333"));
}

#[test]
fn details_post_the_requested_arns() {
    let (base, handle) = serve_once(
        "200 OK",
        r#"[{"event":{"arn":"arn:1","service":"RDS"},"eventDescription":{"latestDescription":"Maintenance window"}}]"#,
    );
    let client = HttpEventSource::new(&base).expect("client");
    let details = client
        .get_event_details(&["arn:1".to_string()])
        .expect("details");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].event_description.latest_description, "Maintenance window");

    let request = handle.join().expect("server");
    assert!(request.starts_with("POST /events/details "));
    assert!(request.contains(r#"{"eventArns":["arn:1"]}"#));

    // No ARNs, no request.
    assert!(client.get_event_details(&[]).expect("empty").is_empty());
}

#[test]
fn forbidden_with_reason_maps_to_auth_error() {
    let (base, handle) = serve_once(
        "403 Forbidden",
        r#"{"message":"User is not registered","extra_data":{"reason":"user_not_registered"}}"#,
    );
    let client = HttpEventSource::new(&base).expect("client");
    let err = client.public_settings().expect_err("forbidden");
    handle.join().expect("server");

    assert_eq!(err.code, "AUTH_FORBIDDEN");
    assert_eq!(err.detail("reason"), Some("user_not_registered"));
    assert_eq!(err.message, "User is not registered");
    assert_eq!(classify_app_error(&err).kind, AuthErrorKind::UserNotRegistered);
}

#[test]
fn unauthorized_and_server_errors_are_coded() {
    let (base, handle) = serve_once("401 Unauthorized", "{}");
    let client = HttpEventSource::new(&base).expect("client");
    let err = client.me().expect_err("401");
    handle.join().expect("server");
    assert_eq!(err.code, "AUTH_UNAUTHORIZED");
    assert!(!err.retryable);

    let (base, handle) = serve_once("503 Service Unavailable", "{}");
    let client = HttpEventSource::new(&base).expect("client");
    let err = client
        .get_affected_entities("arn:1")
        .expect_err("503");
    handle.join().expect("server");
    assert_eq!(err.code, "SOURCE_HTTP_STATUS");
    assert_eq!(err.detail("status"), Some("503"));
    assert!(err.retryable);
}

#[test]
fn unreachable_host_is_retryable() {
    // Bind then drop to get a port nobody is listening on.
    let port = TcpListener::bind("127.0.0.1:0")
        .expect("bind")
        .local_addr()
        .expect("addr")
        .port();
    let client = HttpEventSource::new(&format!("http://127.0.0.1:{port}")).expect("client");
    let err = client.me().expect_err("unreachable");
    assert_eq!(err.code, "SOURCE_UNREACHABLE");
    assert!(err.retryable);
}

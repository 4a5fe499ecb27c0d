//! Tests for the synthetic request lifecycle:
//! - signal ordering with and without a mock
//! - 100-continue emission at construction
//! - handler failure and repeated `end`

use super::*;
use crate::error::InterceptError;
use crate::headers::HeaderValue;
use crate::normalize::{normalize_request_params, RequestOptions};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

fn build(
    url: &str,
    options: Option<RequestOptions>,
    callback: Option<ResponseCallback>,
    handler: Arc<dyn RequestHandler>,
) -> SyntheticRequest {
    let normalized = normalize_request_params(url, options, callback).unwrap();
    SyntheticRequest::new(normalized, handler)
}

fn json_handler() -> Arc<dyn RequestHandler> {
    Arc::new(handler_fn(|_request| async {
        Ok::<_, anyhow::Error>(Some(
            MockedResponse::new(200)
                .header("Content-Type", "application/json")
                .body(r#"{"ok":true}"#),
        ))
    }))
}

fn attach_log(request: &mut SyntheticRequest, log: &Log) {
    let finish = log.clone();
    request.on_finish(Box::new(move || finish.lock().push("finish".into())));
    let response = log.clone();
    request.on_response(Box::new(move |res| {
        let state = if res.is_complete() { "complete" } else { "open" };
        response.lock().push(format!("response:{state}"));
    }));
}

/// Captures what the handler observed.
struct RecordingHandler {
    seen: Mutex<Vec<(InterceptedRequest, Option<u16>, bool)>>,
    reply: Option<MockedResponse>,
}

#[async_trait]
impl RequestHandler for RecordingHandler {
    async fn handle(
        &self,
        request: &InterceptedRequest,
        response: &SyntheticResponse,
    ) -> anyhow::Result<Option<MockedResponse>> {
        tokio::task::yield_now().await;
        self.seen.lock().push((
            request.clone(),
            response.status_code(),
            response.is_complete(),
        ));
        Ok(self.reply.clone())
    }
}

#[tokio::test]
async fn test_mocked_signal_order() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut request = build("http://example.com/users?id=5", None, None, json_handler());
    attach_log(&mut request, &log);

    let end_log = log.clone();
    request
        .end(Some(Box::new(move || end_log.lock().push("end-callback".into()))))
        .await
        .unwrap();

    assert_eq!(
        *log.lock(),
        vec!["finish", "response:open", "end-callback"]
    );
    assert_eq!(
        request.events().history(),
        &[
            RequestEvent::Finish,
            RequestEvent::Response,
            RequestEvent::ResponseEnd
        ]
    );
    assert!(request.is_finished());
    assert!(request.response().is_complete());
    assert!(request.response().is_ended());
}

#[tokio::test]
async fn test_mocked_response_populated() {
    let mut request = build("http://example.com/users?id=5", None, None, json_handler());
    request.end(None).await.unwrap();

    let response = request.response();
    assert_eq!(response.status_code(), Some(200));
    assert_eq!(response.headers().len(), 1);
    assert_eq!(
        response.header("content-type"),
        Some(&HeaderValue::from("application/json"))
    );
    assert_eq!(response.raw_headers(), &["content-type", "application/json"]);
    assert_eq!(response.body_text(), r#"{"ok":true}"#);
}

#[tokio::test]
async fn test_construction_callback_receives_response_once() {
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let sink = statuses.clone();
    let callback: ResponseCallback = Box::new(move |res| sink.lock().push(res.status_code()));

    let mut request = build("http://example.com/", None, Some(callback), json_handler());
    assert_eq!(request.events().listener_count(RequestEvent::Response), 1);

    request.end(None).await.unwrap();

    assert_eq!(*statuses.lock(), vec![Some(200)]);
    assert_eq!(request.events().listener_count(RequestEvent::Response), 0);
}

#[tokio::test]
async fn test_continue_emitted_at_construction() {
    let options = RequestOptions::new().header("expect", "100-continue");
    let request = build("http://example.com/upload", Some(options), None, json_handler());

    assert_eq!(request.events().history(), &[RequestEvent::Continue]);
    assert!(!request.is_finished());
}

#[tokio::test]
async fn test_continue_matches_header_name_case_insensitively() {
    let options = RequestOptions::new().header("Expect", "100-continue");
    let request = build("http://example.com/upload", Some(options), None, json_handler());
    assert!(request.events().has_emitted(RequestEvent::Continue));
}

#[tokio::test]
async fn test_continue_requires_exact_value() {
    for value in [
        HeaderValue::from("100-Continue"),
        HeaderValue::from(vec!["100-continue", "other"]),
    ] {
        let options = RequestOptions::new().header("expect", value);
        let request = build("http://example.com/upload", Some(options), None, json_handler());
        assert!(request.events().history().is_empty());
    }
}

#[tokio::test]
async fn test_no_continue_without_expectation() {
    let options = RequestOptions::new().header("expect", "something-else");
    let request = build("http://example.com/", Some(options), None, json_handler());
    assert!(request.events().history().is_empty());
}

#[tokio::test]
async fn test_pass_through_still_emits_signals() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut request = build("http://example.com/", None, None, Arc::new(Passthrough));
    attach_log(&mut request, &log);

    request.end(None).await.unwrap();

    assert_eq!(*log.lock(), vec!["finish", "response:open"]);
    let response = request.response();
    assert_eq!(response.status_code(), None);
    assert!(response.headers().is_empty());
    assert!(response.raw_headers().is_empty());
    assert!(response.body().is_empty());
    assert!(response.is_complete());
}

#[tokio::test]
async fn test_handler_sees_descriptor_and_unpopulated_response() {
    let handler = Arc::new(RecordingHandler {
        seen: Mutex::new(Vec::new()),
        reply: Some(MockedResponse::new(201)),
    });
    let options = RequestOptions::new()
        .method("put")
        .header("X-Api-Key", "secret");
    let mut request = build(
        "https://example.com:8443/items/7?expand=tags&expand=owner",
        Some(options),
        None,
        handler.clone(),
    );

    request.end(None).await.unwrap();

    let seen = handler.seen.lock();
    assert_eq!(seen.len(), 1);
    let (descriptor, status, complete) = &seen[0];
    assert_eq!(descriptor.url, "https://example.com:8443/items/7");
    assert_eq!(descriptor.method, "PUT");
    assert_eq!(
        descriptor.headers.get("X-Api-Key"),
        Some(&HeaderValue::from("secret"))
    );
    assert!(descriptor.headers.get("x-api-key").is_none());
    assert!(descriptor.body.is_none());
    assert_eq!(descriptor.query.get_all("expand"), vec!["tags", "owner"]);
    assert_eq!(*status, None);
    assert!(!complete);
    assert_eq!(request.response().status_code(), Some(201));
}

#[tokio::test]
async fn test_handler_failure_propagates_without_signals() {
    let handler = Arc::new(handler_fn(|_request| async {
        Err::<Option<MockedResponse>, _>(anyhow::anyhow!("resolver exploded"))
    }));
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut request = build("http://example.com/", None, None, handler);
    attach_log(&mut request, &log);

    let end_called = Arc::new(Mutex::new(false));
    let flag = end_called.clone();
    let err = request
        .end(Some(Box::new(move || *flag.lock() = true)))
        .await
        .unwrap_err();

    assert!(matches!(err, InterceptError::Handler(_)));
    assert!(err.to_string().contains("resolver exploded"));
    assert!(log.lock().is_empty());
    assert!(!*end_called.lock());
    assert!(!request.is_finished());
    assert!(!request.response().is_complete());
}

#[tokio::test]
async fn test_end_after_handler_failure_is_rejected() {
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let handler = Arc::new(handler_fn(move |_request| {
        let call = {
            let mut calls = counter.lock();
            *calls += 1;
            *calls
        };
        async move {
            if call == 1 {
                return Err::<Option<MockedResponse>, _>(anyhow::anyhow!("first attempt fails"));
            }
            Ok(Some(MockedResponse::new(200)))
        }
    }));
    let mut request = build("http://example.com/", None, None, handler);

    let first = request.end(None).await.unwrap_err();
    assert!(matches!(first, InterceptError::Handler(_)));

    let second = request.end(None).await.unwrap_err();
    assert!(matches!(second, InterceptError::AlreadyFinished(id) if id == request.id()));
    assert_eq!(*calls.lock(), 1);
    assert!(request.events().history().is_empty());
    assert_eq!(request.response().status_code(), None);
    assert!(!request.is_finished());
}

#[tokio::test]
async fn test_response_stream_listeners_fire_before_end_callback() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let mut request = build("http://example.com/", None, None, json_handler());

    let response_log = log.clone();
    request.on_response(Box::new(move |res| {
        response_log.lock().push("response".into());
        let data = response_log.clone();
        res.on_data(Box::new(move |chunk| {
            data.lock().push(format!("data:{}", chunk.len()))
        }));
        let end = response_log.clone();
        res.on_end(Box::new(move || end.lock().push("stream-end".into())));
    }));

    let end_log = log.clone();
    request
        .end(Some(Box::new(move || end_log.lock().push("end-callback".into()))))
        .await
        .unwrap();

    assert_eq!(
        *log.lock(),
        vec!["response", "data:11", "stream-end", "end-callback"]
    );
    assert_eq!(request.response().end_listener_count(), 0);
}

#[tokio::test]
async fn test_end_twice_is_rejected() {
    let mut request = build("http://example.com/", None, None, json_handler());
    request.end(None).await.unwrap();

    let err = request.end(None).await.unwrap_err();
    assert!(matches!(err, InterceptError::AlreadyFinished(id) if id == request.id()));
    assert_eq!(request.events().history().len(), 3);
    assert_eq!(request.response().body_text(), r#"{"ok":true}"#);
}

#[tokio::test]
async fn test_socket_shared_with_response() {
    let request = build("http://example.com/", None, None, json_handler());
    assert_eq!(request.socket(), request.connection());
    assert_eq!(request.socket(), request.response().socket());
}

#[tokio::test]
async fn test_default_method_is_get() {
    let request = build("http://example.com/", None, None, Arc::new(Passthrough));
    assert_eq!(request.method(), "GET");
    assert!(request.intercepted_request().headers.is_empty());
}

#[tokio::test]
async fn test_independent_requests_interleave() {
    let slow = Arc::new(handler_fn(|request: InterceptedRequest| async move {
        if request.url.ends_with("/slow") {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        Ok::<_, anyhow::Error>(Some(MockedResponse::new(200).body(request.url)))
    }));

    let mut first = build("http://example.com/slow", None, None, slow.clone());
    let mut second = build("http://example.com/fast", None, None, slow);

    let (a, b) = tokio::join!(first.end(None), second.end(None));
    a.unwrap();
    b.unwrap();

    assert_eq!(first.response().body_text(), "http://example.com/slow");
    assert_eq!(second.response().body_text(), "http://example.com/fast");
    assert_eq!(first.events().history().len(), 3);
    assert_eq!(second.events().history().len(), 3);
}

//! Endpoint tests for `/interactions` with stub handlers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use bookclub_http::{build_router, AppState};
use bookclub_kernel::interaction::InteractionCallback;
use bookclub_kernel::settings::ServerSettings;
use bookclub_kernel::{
    Book, BookLookup, ClubState, ClubStore, Dispatcher, Handler, HandlerCtx, HandlerError,
    HandlerKind, HandlerRegistry, Invocation, LookupError, Reply, Response, SnapshotSink,
};
use bookclub_platform::{InteractionApi, PlatformError};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

struct NoLookup;

#[async_trait]
impl BookLookup for NoLookup {
    async fn lookup(&self, _url: &str) -> Result<Option<Book>, LookupError> {
        Ok(None)
    }

    async fn search(&self, _query: &str) -> Result<Vec<Book>, LookupError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct CountingSink {
    saves: Mutex<usize>,
}

#[async_trait]
impl SnapshotSink for CountingSink {
    async fn save(&self, _state: &ClubState) -> anyhow::Result<()> {
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingApi {
    edits: Mutex<Vec<(String, Reply)>>,
}

#[async_trait]
impl InteractionApi for RecordingApi {
    async fn create_response(
        &self,
        _interaction_id: &str,
        _token: &str,
        _callback: &InteractionCallback,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn edit_original(&self, token: &str, reply: &Reply) -> Result<(), PlatformError> {
        self.edits
            .lock()
            .unwrap()
            .push((token.to_string(), reply.clone()));
        Ok(())
    }
}

struct EchoCommand;

#[async_trait]
impl Handler for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn handle(
        &self,
        _ctx: &HandlerCtx,
        invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        let text = invocation.string("text").unwrap_or_default().to_string();
        Ok(Response::Immediate(Reply::text(format!(
            "{} says {}",
            invocation.caller.display_name, text
        ))))
    }
}

struct SlowCommand;

#[async_trait]
impl Handler for SlowCommand {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn handle(
        &self,
        _ctx: &HandlerCtx,
        _invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        Ok(Response::deferred(Reply::text("on it"), async {
            Ok(Reply::text("done"))
        }))
    }
}

struct PressAction;

#[async_trait]
impl Handler for PressAction {
    fn name(&self) -> &'static str {
        "press"
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    async fn handle(
        &self,
        _ctx: &HandlerCtx,
        invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        Ok(Response::Immediate(Reply::text(invocation.values.join(","))))
    }
}

struct Harness {
    router: axum::Router,
    api: Arc<RecordingApi>,
    sink: Arc<CountingSink>,
}

fn harness() -> Harness {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(EchoCommand)).unwrap();
    registry.register(Arc::new(SlowCommand)).unwrap();
    registry.register(Arc::new(PressAction)).unwrap();

    let sink = Arc::new(CountingSink::default());
    let api = Arc::new(RecordingApi::default());
    let ctx = HandlerCtx {
        store: ClubStore::default(),
        lookup: Arc::new(NoLookup),
    };
    let state = AppState {
        dispatcher: Arc::new(Dispatcher::new(registry, ctx, sink.clone())),
        api: api.clone(),
        verifier: None,
    };

    Harness {
        router: build_router(state, &ServerSettings::default()),
        api,
        sink,
    }
}

async fn post(router: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/interactions")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met in time");
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let h = harness();
    let (status, body) = post(h.router, json!({"id": "1", "type": 1})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"type": 1}));
    assert_eq!(*h.sink.saves.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_command_reply_is_the_http_body() {
    let h = harness();
    let (status, body) = post(
        h.router,
        json!({
            "id": "1",
            "type": 2,
            "token": "tok",
            "data": {"name": "echo", "options": [{"name": "text", "type": 3, "value": "hi"}]},
            "member": {"nick": "Al", "user": {"id": "u1", "username": "alice"}}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["content"], "Al says hi");

    let sink = h.sink.clone();
    wait_for(move || *sink.saves.lock().unwrap() == 1).await;
}

#[tokio::test]
async fn test_deferred_command_acks_then_edits_original() {
    let h = harness();
    let (status, body) = post(
        h.router,
        json!({"id": "1", "type": 2, "token": "tok-9", "data": {"name": "slow"}}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "on it");

    let api = h.api.clone();
    wait_for(move || api.edits.lock().unwrap().len() == 1).await;
    let edits = h.api.edits.lock().unwrap();
    assert_eq!(edits[0], ("tok-9".to_string(), Reply::text("done")));
}

#[tokio::test]
async fn test_component_callback_reaches_action() {
    let h = harness();
    let (status, body) = post(
        h.router,
        json!({
            "id": "1",
            "type": 3,
            "data": {"custom_id": "press", "values": ["a", "b"]},
            "user": {"id": "u1", "username": "alice"}
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "a,b");
}

#[tokio::test]
async fn test_unknown_command_is_not_defined() {
    let h = harness();
    let (status, body) = post(
        h.router,
        json!({"id": "1", "type": 2, "data": {"name": "dance"}}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "command dance not defined");
    assert_eq!(*h.sink.saves.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_unsupported_interaction_type_is_bad_request() {
    let h = harness();
    let (status, _) = post(h.router, json!({"id": "1", "type": 4})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_healthz() {
    let h = harness();
    let response = h
        .router
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

//! Real-time session transport.
//!
//! Interactions arrive as gateway frames over a live connection; every
//! response, including the initial one, goes out through the platform REST
//! API.

use std::sync::Arc;

use async_trait::async_trait;
use bookclub_kernel::interaction::{Interaction, InteractionCallback};
use bookclub_kernel::{Dispatcher, Reply, Responder};
use bookclub_platform::InteractionApi;
use tokio::task::JoinSet;

pub mod frame;

pub use frame::{parse_frame, FrameSource, LineSource};

pub struct GatewaySession {
    dispatcher: Arc<Dispatcher>,
    api: Arc<dyn InteractionApi>,
}

impl GatewaySession {
    pub fn new(dispatcher: Arc<Dispatcher>, api: Arc<dyn InteractionApi>) -> Self {
        Self { dispatcher, api }
    }

    /// Handle interactions until the source closes, then wait for in-flight
    /// handlers to finish.
    pub async fn run<S: FrameSource>(&self, mut source: S) -> anyhow::Result<()> {
        tracing::info!("gateway session started");
        let mut in_flight = JoinSet::new();

        while let Some(interaction) = source.next_interaction().await? {
            let dispatcher = self.dispatcher.clone();
            let api = self.api.clone();
            in_flight.spawn(async move {
                handle_interaction(&dispatcher, api, interaction).await;
            });

            // Reap finished handlers so the set does not grow unbounded.
            while in_flight.try_join_next().is_some() {}
        }

        while in_flight.join_next().await.is_some() {}
        tracing::info!("gateway session closed");
        Ok(())
    }
}

/// Dispatch one interaction received over the session.
pub async fn handle_interaction(
    dispatcher: &Dispatcher,
    api: Arc<dyn InteractionApi>,
    interaction: Interaction,
) {
    let mut responder = SessionResponder {
        api,
        interaction_id: interaction.id.clone(),
        token: interaction.token.clone(),
    };

    let invocation = match interaction.to_invocation() {
        Ok(invocation) => invocation,
        Err(err) => {
            tracing::warn!(interaction = %interaction.id, error = %err, "unhandled interaction");
            return;
        }
    };

    let handler = match dispatcher.resolve(invocation.kind, &invocation.name) {
        Ok(handler) => handler,
        Err(err) => {
            if let Err(send_err) = responder.send(Reply::text(format!("Sorry, {err}."))).await {
                tracing::warn!(error = %send_err, "failed to report unknown handler");
            }
            return;
        }
    };

    dispatcher.run(handler, invocation, &mut responder).await;
}

struct SessionResponder {
    api: Arc<dyn InteractionApi>,
    interaction_id: String,
    token: String,
}

#[async_trait]
impl Responder for SessionResponder {
    async fn send(&mut self, reply: Reply) -> anyhow::Result<()> {
        self.api
            .create_response(
                &self.interaction_id,
                &self.token,
                &InteractionCallback::message(reply),
            )
            .await?;
        Ok(())
    }

    async fn edit(&mut self, reply: Reply) -> anyhow::Result<()> {
        self.api.edit_original(&self.token, &reply).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookclub_kernel::{
        Book, BookLookup, ClubState, ClubStore, Handler, HandlerCtx, HandlerError,
        HandlerRegistry, Invocation, LookupError, Response, SnapshotSink,
    };
    use bookclub_platform::PlatformError;
    use std::sync::Mutex;
    use tokio::io::BufReader;

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

    #[derive(Debug, PartialEq)]
    enum Call {
        Create(String, InteractionCallback),
        Edit(String, Reply),
    }

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<Call>>,
    }

    #[async_trait]
    impl InteractionApi for RecordingApi {
        async fn create_response(
            &self,
            interaction_id: &str,
            _token: &str,
            callback: &InteractionCallback,
        ) -> Result<(), PlatformError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Create(interaction_id.to_string(), callback.clone()));
            Ok(())
        }

        async fn edit_original(&self, token: &str, reply: &Reply) -> Result<(), PlatformError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Edit(token.to_string(), reply.clone()));
            Ok(())
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

    fn session() -> (GatewaySession, Arc<RecordingApi>, Arc<CountingSink>) {
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::new(SlowCommand)).unwrap();
        let sink = Arc::new(CountingSink::default());
        let ctx = HandlerCtx {
            store: ClubStore::default(),
            lookup: Arc::new(NoLookup),
        };
        let dispatcher = Arc::new(Dispatcher::new(registry, ctx, sink.clone()));
        let api = Arc::new(RecordingApi::default());
        (GatewaySession::new(dispatcher, api.clone()), api, sink)
    }

    #[tokio::test]
    async fn test_session_acks_then_edits() {
        let (session, api, sink) = session();
        let input = r#"{"op":0,"t":"INTERACTION_CREATE","d":{"id":"7","type":2,"token":"tok","data":{"name":"slow"}}}"#;

        session
            .run(LineSource::new(BufReader::new(input.as_bytes())))
            .await
            .unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                Call::Create(
                    "7".to_string(),
                    InteractionCallback::message(Reply::text("on it"))
                ),
                Call::Edit("tok".to_string(), Reply::text("done")),
            ]
        );
        assert_eq!(*sink.saves.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_command_is_reported_without_persisting() {
        let (session, api, sink) = session();
        let input = r#"{"id":"8","type":2,"token":"tok","data":{"name":"dance"}}"#;

        session
            .run(LineSource::new(BufReader::new(input.as_bytes())))
            .await
            .unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![Call::Create(
                "8".to_string(),
                InteractionCallback::message(Reply::text("Sorry, command dance not defined."))
            )]
        );
        assert_eq!(*sink.saves.lock().unwrap(), 0);
    }
}

//! Runs one resolved handler against the shared state and persists it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::handler::{Handler, HandlerCtx, HandlerError, HandlerKind, Invocation, Response};
use crate::registry::{DispatchError, HandlerRegistry};
use crate::reply::Reply;
use crate::store::{ClubStore, SnapshotSink};

/// Transport side of one request: the initial response and its later edit.
#[async_trait]
pub trait Responder: Send {
    /// Send the initial response.
    async fn send(&mut self, reply: Reply) -> anyhow::Result<()>;

    /// Replace the content of the initial response.
    async fn edit(&mut self, reply: Reply) -> anyhow::Result<()>;
}

pub struct Dispatcher {
    registry: HandlerRegistry,
    ctx: HandlerCtx,
    snapshots: Arc<dyn SnapshotSink>,
    /// Orders snapshot-then-save so a newer state is never overwritten by an
    /// older one.
    persist_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        registry: HandlerRegistry,
        ctx: HandlerCtx,
        snapshots: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self {
            registry,
            ctx,
            snapshots,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ClubStore {
        &self.ctx.store
    }

    pub fn resolve(
        &self,
        kind: HandlerKind,
        name: &str,
    ) -> Result<Arc<dyn Handler>, DispatchError> {
        self.registry.resolve(kind, name).inspect_err(|err| {
            tracing::warn!(%kind, name = %name, error = %err, "no handler registered");
        })
    }

    /// Handle one invocation end to end: initial reply, optional follow-up
    /// edit, then exactly one snapshot write.
    pub async fn run(
        &self,
        handler: Arc<dyn Handler>,
        invocation: Invocation,
        responder: &mut dyn Responder,
    ) {
        tracing::info!(
            handler = handler.name(),
            kind = %handler.kind(),
            user = %invocation.caller.id,
            "dispatching"
        );

        let response = handler
            .handle(&self.ctx, invocation)
            .await
            .unwrap_or_else(|err| Response::Immediate(failure_reply(handler.as_ref(), &err)));

        match response {
            Response::Immediate(reply) => {
                if let Err(err) = responder.send(reply).await {
                    tracing::warn!(handler = handler.name(), error = %err, "failed to send reply");
                }
            }
            Response::Deferred { ack, follow_up } => {
                if let Err(err) = responder.send(ack).await {
                    tracing::warn!(
                        handler = handler.name(),
                        error = %err,
                        "failed to send acknowledgement"
                    );
                }

                let reply = follow_up
                    .await
                    .unwrap_or_else(|err| failure_reply(handler.as_ref(), &err));

                if let Err(err) = responder.edit(reply).await {
                    tracing::warn!(
                        handler = handler.name(),
                        error = %err,
                        "failed to update reply"
                    );
                }
            }
        }

        self.persist().await;
    }

    /// Write the whole state. Failures are logged; memory is never rolled back.
    pub async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.ctx.store.snapshot().await;
        if let Err(err) = self.snapshots.save(&snapshot).await {
            tracing::error!(error = ?err, "failed to persist club state");
        }
    }
}

fn failure_reply(handler: &dyn Handler, err: &HandlerError) -> Reply {
    tracing::error!(handler = handler.name(), error = %err, "handler failed");
    Reply::text(handler.failure_message())
}

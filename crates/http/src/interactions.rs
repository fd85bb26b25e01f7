//! `POST /interactions`: the platform's signed HTTP callback.
//!
//! The initial response is the HTTP response body. Later edits go through the
//! platform REST API, after the HTTP exchange has finished.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use axum::{extract::State, Json};
use bookclub_kernel::interaction::{Interaction, InteractionCallback};
use bookclub_kernel::{Reply, Responder};
use bookclub_platform::InteractionApi;
use tokio::sync::oneshot;

use crate::error::AppError;
use crate::AppState;

pub async fn interactions(
    State(state): State<AppState>,
    Json(interaction): Json<Interaction>,
) -> Result<Json<InteractionCallback>, AppError> {
    if interaction.is_ping() {
        return Ok(Json(InteractionCallback::pong()));
    }

    let invocation = interaction.to_invocation()?;
    let handler = state.dispatcher.resolve(invocation.kind, &invocation.name)?;

    let (initial_tx, initial_rx) = oneshot::channel();
    let mut responder = CallbackResponder {
        initial: Some(initial_tx),
        api: state.api.clone(),
        token: interaction.token,
    };

    // Runs to completion even if the platform stops waiting for this request.
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        dispatcher.run(handler, invocation, &mut responder).await;
    });

    let reply = initial_rx
        .await
        .map_err(|_| anyhow!("handler finished without an initial reply"))?;
    Ok(Json(InteractionCallback::message(reply)))
}

struct CallbackResponder {
    initial: Option<oneshot::Sender<Reply>>,
    api: Arc<dyn InteractionApi>,
    token: String,
}

#[async_trait]
impl Responder for CallbackResponder {
    async fn send(&mut self, reply: Reply) -> anyhow::Result<()> {
        let Some(initial) = self.initial.take() else {
            bail!("initial response already sent");
        };
        initial
            .send(reply)
            .map_err(|_| anyhow!("callback request closed before the reply was ready"))
    }

    async fn edit(&mut self, reply: Reply) -> anyhow::Result<()> {
        self.api.edit_original(&self.token, &reply).await?;
        Ok(())
    }
}

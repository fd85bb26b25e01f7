use std::sync::Arc;

use async_trait::async_trait;
use bookclub_kernel::{Handler, HandlerCtx, HandlerError, Invocation, Reply, Response};
use serde_json::json;

use crate::utils;

/// `/test`: liveness check with a random emoji.
pub struct PingCommand;

#[async_trait]
impl Handler for PingCommand {
    fn name(&self) -> &'static str {
        "test"
    }

    fn definition(&self) -> Option<serde_json::Value> {
        Some(json!({
            "name": "test",
            "description": "Basic command",
            "type": 1
        }))
    }

    async fn handle(
        &self,
        _ctx: &HandlerCtx,
        _invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        Ok(Response::Immediate(Reply::text(format!(
            "hello world {}",
            utils::random_emoji()
        ))))
    }
}

pub fn create_handler() -> Arc<dyn Handler> {
    Arc::new(PingCommand)
}

use std::sync::Arc;

use async_trait::async_trait;
use bookclub_kernel::{
    Handler, HandlerCtx, HandlerError, HandlerKind, Invocation, Reply, Response,
};

use super::vote::BALLOT_MENU_ID;

const NO_ACTIVE_VOTE: &str = "There is no vote running right now! Start one with `/vote`.";

/// Ballot select-menu callback: replaces the caller's ballots and echoes the
/// full tally.
pub struct BookVoteAction;

#[async_trait]
impl Handler for BookVoteAction {
    fn name(&self) -> &'static str {
        BALLOT_MENU_ID
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Action
    }

    fn failure_message(&self) -> &'static str {
        "Something went wrong while registering your vote.."
    }

    async fn handle(
        &self,
        ctx: &HandlerCtx,
        invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        let caller = &invocation.caller;
        if caller.id.is_empty() {
            return Err(anyhow::anyhow!("vote cast without a caller identity").into());
        }

        let mut state = ctx.store.lock().await;
        if state.vote.books.is_empty() {
            return Ok(Response::Immediate(Reply::text(NO_ACTIVE_VOTE)));
        }

        state.vote.cast(&caller.id, &invocation.values);
        let tally = state
            .vote
            .tally()
            .iter()
            .map(|entry| entry.render())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Response::Immediate(Reply::text(format!(
            "{}, your vote was registered! Current votes are:\n{tally}",
            caller.display_name
        ))))
    }
}

pub fn create_handler() -> Arc<dyn Handler> {
    Arc::new(BookVoteAction)
}

use std::sync::Arc;

use async_trait::async_trait;
use bookclub_kernel::reply::{
    truncate_chars, SelectMenu, SelectOption, MAX_OPTION_TEXT, MAX_SELECT_VALUES,
};
use bookclub_kernel::{Book, Handler, HandlerCtx, HandlerError, Invocation, Reply, Response};
use serde_json::json;

/// Custom id of the ballot select menu, answered by the `book_vote` action.
pub const BALLOT_MENU_ID: &str = "book_vote";

const TOO_FEW_BOOKS: &str = "Before starting a poll, make sure you have at least two books on \
    your shortlist! Check out the commands under `/shortlist` to do so.";

/// `/vote`: start a new poll over the current shortlist.
pub struct VoteCommand;

#[async_trait]
impl Handler for VoteCommand {
    fn name(&self) -> &'static str {
        "vote"
    }

    fn definition(&self) -> Option<serde_json::Value> {
        Some(json!({
            "name": "vote",
            "description": "Start a vote on the books in the shortlist",
            "type": 1
        }))
    }

    fn failure_message(&self) -> &'static str {
        "Something went wrong while starting the vote.."
    }

    async fn handle(
        &self,
        ctx: &HandlerCtx,
        _invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        let mut state = ctx.store.lock().await;
        if state.shortlist.len() > MAX_SELECT_VALUES {
            return Ok(Response::Immediate(Reply::text(too_many_books(
                state.shortlist.len(),
            ))));
        }
        let Some(vote) = state.start_vote() else {
            return Ok(Response::Immediate(Reply::text(TOO_FEW_BOOKS)));
        };

        tracing::info!(nominees = vote.books.len(), "vote started");
        Ok(Response::Immediate(ballot(&vote.books)))
    }
}

fn too_many_books(count: usize) -> String {
    format!(
        "A poll can hold at most {MAX_SELECT_VALUES} books, but the shortlist has {count}! \
         Trim it with `/shortlist remove` before starting a vote."
    )
}

/// Poll message with one multi-select option per nominee. At most
/// `MAX_SELECT_VALUES` books.
pub fn ballot(books: &[Book]) -> Reply {
    let options = books
        .iter()
        .map(|book| SelectOption {
            label: truncate_chars(&book.title, MAX_OPTION_TEXT),
            value: truncate_chars(&book.id, MAX_OPTION_TEXT),
            description: format!("By {}", book.author),
        })
        .collect();

    let menu = SelectMenu::new(BALLOT_MENU_ID, "Pick your votes")
        .options(options)
        .range(1, books.len().min(MAX_SELECT_VALUES));

    Reply::text("Ok folks, cast your vote! The nominees are:\n").with_select(menu)
}

pub fn create_handler() -> Arc<dyn Handler> {
    Arc::new(VoteCommand)
}

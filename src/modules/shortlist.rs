use std::sync::Arc;

use async_trait::async_trait;
use bookclub_kernel::{Handler, HandlerCtx, HandlerError, Invocation, Reply, Response};
use serde_json::json;

use crate::utils;

const EMPTY_HINT: &str =
    "No books in the shortlist yet! Add some with \"/shortlist add <book url>\"";
const ADD_INPUT_INVALID: &str = "Could not use that input to add a book to the shortlist..";
const REMOVE_INPUT_INVALID: &str = "Could not use that input to remove a book from the shortlist..";

/// `/shortlist {list | add | remove}`
pub struct ShortlistCommand;

#[async_trait]
impl Handler for ShortlistCommand {
    fn name(&self) -> &'static str {
        "shortlist"
    }

    fn definition(&self) -> Option<serde_json::Value> {
        Some(json!({
            "name": "shortlist",
            "description": "Manage the book shortlist",
            "type": 1,
            "options": [
                {
                    "type": 1,
                    "name": "list",
                    "description": "Show the books on the shortlist"
                },
                {
                    "type": 1,
                    "name": "add",
                    "description": "Add a book to the shortlist",
                    "options": [{
                        "type": 3,
                        "name": "book_url",
                        "description": "Link to the book",
                        "required": true
                    }]
                },
                {
                    "type": 1,
                    "name": "remove",
                    "description": "Remove a book from the shortlist",
                    "options": [{
                        "type": 4,
                        "name": "entry_number",
                        "description": "Number of the book as shown by /shortlist list",
                        "required": true
                    }]
                }
            ]
        }))
    }

    fn failure_message(&self) -> &'static str {
        "Something went wrong while searching.."
    }

    async fn handle(
        &self,
        ctx: &HandlerCtx,
        invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        match invocation.subcommand.as_deref() {
            Some("list") => Ok(Response::Immediate(list(ctx).await)),
            Some("add") => Ok(add(ctx, &invocation)),
            Some("remove") => Ok(Response::Immediate(remove(ctx, &invocation).await)),
            other => Err(HandlerError::MissingSubcommand(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

async fn list(ctx: &HandlerCtx) -> Reply {
    let state = ctx.store.lock().await;
    let entries = state
        .shortlist
        .books
        .iter()
        .enumerate()
        .map(|(i, book)| format!("{}) {}.", i + 1, book.describe()))
        .collect();
    Reply::text(format!(
        "This is the current shortlist:\n{}",
        utils::list_or_hint(entries, "\n", EMPTY_HINT)
    ))
}

fn add(ctx: &HandlerCtx, invocation: &Invocation) -> Response {
    let Some(url) = invocation.string("book_url").map(str::to_string) else {
        tracing::warn!("shortlist add invoked without a book_url");
        return Response::Immediate(Reply::text(ADD_INPUT_INVALID));
    };

    let ack = Reply::text(
        "Request to add the book to the shortlist received! Let me find some more data..",
    );
    let ctx = ctx.clone();
    Response::deferred(ack, async move {
        let Some(book) = ctx.lookup.lookup(&url).await? else {
            return Ok(Reply::text("Mehhh.. I couldn't find the book."));
        };

        let content = format!(
            "The following book was added to the shortlist:\n{}.",
            book.describe()
        );
        ctx.store.lock().await.shortlist.add(book);
        Ok(Reply::text(content))
    })
}

async fn remove(ctx: &HandlerCtx, invocation: &Invocation) -> Reply {
    let Some(entry_number) = invocation.integer("entry_number") else {
        tracing::warn!("shortlist remove invoked without an entry_number");
        return Reply::text(REMOVE_INPUT_INVALID);
    };

    match ctx.store.lock().await.shortlist.remove_entry(entry_number) {
        Some(book) => Reply::text(format!(
            "Removed this book from the shortlist:\n{}.",
            book.describe()
        )),
        None => Reply::text("Uh, we don't have a book with that number on our shortlist!"),
    }
}

pub fn create_handler() -> Arc<dyn Handler> {
    Arc::new(ShortlistCommand)
}

use std::sync::Arc;

use async_trait::async_trait;
use bookclub_kernel::{Book, Handler, HandlerCtx, HandlerError, Invocation, Reply, Response};
use serde_json::json;

const INPUT_INVALID: &str = "Could not use that input for a search..";

/// `/search <query>`: top provider results, numbered.
pub struct SearchCommand;

#[async_trait]
impl Handler for SearchCommand {
    fn name(&self) -> &'static str {
        "search"
    }

    fn definition(&self) -> Option<serde_json::Value> {
        Some(json!({
            "name": "search",
            "description": "Search for a book",
            "type": 1,
            "options": [{
                "type": 3,
                "name": "query",
                "description": "Title, author, or both",
                "required": true
            }]
        }))
    }

    fn failure_message(&self) -> &'static str {
        "Ugh, my creator failed and some error happened..."
    }

    async fn handle(
        &self,
        ctx: &HandlerCtx,
        invocation: Invocation,
    ) -> Result<Response, HandlerError> {
        let Some(query) = invocation.string("query").map(str::to_string) else {
            tracing::warn!("search invoked without a query");
            return Ok(Response::Immediate(Reply::text(INPUT_INVALID)));
        };

        let lookup = ctx.lookup.clone();
        let ack = Reply::text(format!("Searching for \"{query}\".."));
        Ok(Response::deferred(ack, async move {
            let books = lookup.search(&query).await?;
            Ok(Reply::text(render_results(&query, &books)))
        }))
    }
}

fn render_results(query: &str, books: &[Book]) -> String {
    let summary = if books.is_empty() {
        "No results!".to_string()
    } else {
        books
            .iter()
            .enumerate()
            .map(|(i, book)| {
                format!(
                    "{}) {} by {} can be found at: {}",
                    i + 1,
                    book.title,
                    book.author,
                    book.url
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    format!("You searched for \"{query}\". The top results I got:\n{summary}")
}

pub fn create_handler() -> Arc<dyn Handler> {
    Arc::new(SearchCommand)
}

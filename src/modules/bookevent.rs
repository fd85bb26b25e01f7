use std::sync::Arc;

use async_trait::async_trait;
use bookclub_kernel::{Event, Handler, HandlerCtx, HandlerError, Invocation, Reply, Response};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::utils;

const EMPTY_HINT: &str =
    "There are no events scheduled! Add some with \"/bookevent add <Date> <book url>\"";
const ADD_INPUT_INVALID: &str = "Could not use that input to add an event..";
const REMOVE_INPUT_INVALID: &str = "Could not use that input to remove an event..";
const DATE_INVALID: &str =
    "I couldn't understand that date.. Try something like 2024-05-01 19:30 (UTC).";

/// `/bookevent {list | add | remove}`
pub struct BookEventCommand;

#[async_trait]
impl Handler for BookEventCommand {
    fn name(&self) -> &'static str {
        "bookevent"
    }

    fn definition(&self) -> Option<serde_json::Value> {
        Some(json!({
            "name": "bookevent",
            "description": "Manage scheduled book club events",
            "type": 1,
            "options": [
                {
                    "type": 1,
                    "name": "list",
                    "description": "Show the scheduled events"
                },
                {
                    "type": 1,
                    "name": "add",
                    "description": "Schedule a discussion of a book",
                    "options": [
                        {
                            "type": 3,
                            "name": "date",
                            "description": "When, e.g. 2024-05-01 19:30 (UTC)",
                            "required": true
                        },
                        {
                            "type": 3,
                            "name": "url",
                            "description": "Link to the book",
                            "required": true
                        }
                    ]
                },
                {
                    "type": 1,
                    "name": "remove",
                    "description": "Cancel a scheduled event",
                    "options": [{
                        "type": 4,
                        "name": "entry_number",
                        "description": "Number of the event as shown by /bookevent list",
                        "required": true
                    }]
                }
            ]
        }))
    }

    fn failure_message(&self) -> &'static str {
        "Something went wrong while getting your events.."
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
        .events
        .iter()
        .enumerate()
        .map(|(i, event)| render_event(i + 1, event))
        .collect();
    Reply::text(format!(
        "These are the scheduled book club events:\n{}",
        utils::list_or_hint(entries, "\n", EMPTY_HINT)
    ))
}

fn render_event(entry_number: usize, event: &Event) -> String {
    format!(
        "#{entry_number} On {}, this book is scheduled:\n{}.\n",
        display_date(event.date),
        event.book.describe()
    )
}

fn add(ctx: &HandlerCtx, invocation: &Invocation) -> Response {
    let (Some(raw_date), Some(url)) = (invocation.string("date"), invocation.string("url")) else {
        tracing::warn!("bookevent add invoked without date or url");
        return Response::Immediate(Reply::text(ADD_INPUT_INVALID));
    };
    let Some(date) = parse_date(raw_date) else {
        tracing::debug!(date = %raw_date, "rejecting unparseable event date");
        return Response::Immediate(Reply::text(DATE_INVALID));
    };

    let url = url.to_string();
    let ack = Reply::text(
        "Request to add a new event received! Let me find some more data on the book..",
    );
    let ctx = ctx.clone();
    Response::deferred(ack, async move {
        let Some(book) = ctx.lookup.lookup(&url).await? else {
            return Ok(Reply::text(
                "Mehhh.. I couldn't find the book you were trying to add.",
            ));
        };

        let content = format!(
            "The following event was added to the events list:\n\
             On {}, we will discuss {}. Get your Libby reservation now!",
            display_date(date),
            book.describe()
        );
        ctx.store.lock().await.add_event(date, book);
        Ok(Reply::text(content))
    })
}

async fn remove(ctx: &HandlerCtx, invocation: &Invocation) -> Reply {
    let Some(entry_number) = invocation.integer("entry_number") else {
        tracing::warn!("bookevent remove invoked without an entry_number");
        return Reply::text(REMOVE_INPUT_INVALID);
    };

    match ctx.store.lock().await.remove_event(entry_number) {
        Some(event) => Reply::text(format!(
            "Removed this event from your scheduled events:\n{} by {} which was scheduled for {}.",
            event.book.title,
            event.book.author,
            display_date(event.date)
        )),
        None => Reply::text("Uh, we don't have an event with that number in our scheduled events!"),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`. Values without an
/// offset are taken as UTC. Years outside 0000-9999 cannot be stored as
/// RFC 3339 and are rejected.
fn parse_date(input: &str) -> Option<OffsetDateTime> {
    parse_any_year(input.trim()).filter(|date| (0..=9999).contains(&date.year()))
}

fn parse_any_year(input: &str) -> Option<OffsetDateTime> {
    if let Ok(date) = OffsetDateTime::parse(input, &Rfc3339) {
        return Some(date);
    }
    let minutes = format_description!("[year]-[month]-[day] [hour]:[minute]");
    if let Ok(date) = PrimitiveDateTime::parse(input, minutes) {
        return Some(date.assume_utc());
    }
    Date::parse(input, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn display_date(date: OffsetDateTime) -> String {
    let date = date.to_offset(time::UtcOffset::UTC);
    format!(
        "{} {:02}:{:02} UTC",
        date.date(),
        date.hour(),
        date.minute()
    )
}

pub fn create_handler() -> Arc<dyn Handler> {
    Arc::new(BookEventCommand)
}

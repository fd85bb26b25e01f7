use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;

use crate::club::UserId;
use crate::lookup::{BookLookup, LookupError};
use crate::reply::Reply;
use crate::store::ClubStore;

/// Whether a handler answers a slash command or a UI component callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Command,
    Action,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Command => f.write_str("command"),
            HandlerKind::Action => f.write_str("action"),
        }
    }
}

/// The user who triggered an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub display_name: String,
}

/// Typed value of one command option.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
}

/// Transport-neutral request handed to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub kind: HandlerKind,
    /// Command name or component custom id
    pub name: String,
    pub caller: Caller,
    pub subcommand: Option<String>,
    pub options: BTreeMap<String, OptionValue>,
    /// Selected values of a component callback
    pub values: Vec<String>,
}

impl Invocation {
    pub fn command(name: impl Into<String>) -> Self {
        Self::new(HandlerKind::Command, name.into())
    }

    pub fn action(custom_id: impl Into<String>) -> Self {
        Self::new(HandlerKind::Action, custom_id.into())
    }

    fn new(kind: HandlerKind, name: String) -> Self {
        Self {
            kind,
            name,
            caller: Caller::default(),
            subcommand: None,
            options: BTreeMap::new(),
            values: Vec::new(),
        }
    }

    pub fn caller(mut self, id: impl Into<String>, display_name: impl Into<String>) -> Self {
        self.caller = Caller {
            id: id.into(),
            display_name: display_name.into(),
        };
        self
    }

    pub fn subcommand(mut self, name: impl Into<String>) -> Self {
        self.subcommand = Some(name.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// String option by name.
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.options.get(name)? {
            OptionValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Integer option by name.
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.options.get(name)? {
            OptionValue::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

/// Faults a handler could not turn into a specific reply. The dispatcher
/// logs them and answers with the handler's generic failure message.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("missing subcommand implementation: {0}")]
    MissingSubcommand(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Slow second phase of a deferred response.
pub type FollowUp = BoxFuture<'static, Result<Reply, HandlerError>>;

/// What a handler produces for the transport.
pub enum Response {
    /// Final reply, sent as the initial response.
    Immediate(Reply),
    /// `ack` is sent at once; the initial response is then edited with the
    /// outcome of `follow_up`.
    Deferred { ack: Reply, follow_up: FollowUp },
}

impl Response {
    pub fn deferred<F>(ack: Reply, follow_up: F) -> Self
    where
        F: Future<Output = Result<Reply, HandlerError>> + Send + 'static,
    {
        Response::Deferred {
            ack,
            follow_up: follow_up.boxed(),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Immediate(reply) => f.debug_tuple("Immediate").field(reply).finish(),
            Response::Deferred { ack, .. } => f
                .debug_struct("Deferred")
                .field("ack", ack)
                .finish_non_exhaustive(),
        }
    }
}

/// Collaborators available to every handler.
#[derive(Clone)]
pub struct HandlerCtx {
    pub store: ClubStore,
    pub lookup: Arc<dyn BookLookup>,
}

/// A command or action handler registered under a fixed name.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Command name or component custom id
    fn name(&self) -> &'static str;

    fn kind(&self) -> HandlerKind {
        HandlerKind::Command
    }

    /// Platform command definition as JSON, installed by the CLI.
    /// Actions have none.
    fn definition(&self) -> Option<serde_json::Value> {
        None
    }

    /// Reply used when `handle` or its follow-up fails.
    fn failure_message(&self) -> &'static str {
        "Yeah, no, something went wrong."
    }

    async fn handle(&self, ctx: &HandlerCtx, invocation: Invocation)
        -> Result<Response, HandlerError>;
}

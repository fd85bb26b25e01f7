//! Chat platform interaction envelope, shared by the HTTP callback and the
//! gateway session.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::handler::{HandlerKind, Invocation, OptionValue};
use crate::reply::Reply;

pub const PING: u8 = 1;
pub const APPLICATION_COMMAND: u8 = 2;
pub const MESSAGE_COMPONENT: u8 = 3;

const PONG: u8 = 1;
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;

const SUB_COMMAND: u8 = 1;
const SUB_COMMAND_GROUP: u8 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("interaction type {0} is not handled")]
    UnsupportedType(u8),

    #[error("interaction is missing its data")]
    MissingData,

    #[error("interaction data is missing {0}")]
    MissingField(&'static str),

    #[error("option '{0}' has an unusable value")]
    BadOption(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(default)]
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOptionData>,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOptionData {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandOptionData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub nick: Option<String>,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl Interaction {
    pub fn is_ping(&self) -> bool {
        self.kind == PING
    }

    /// Handler kind addressed by this interaction.
    pub fn handler_kind(&self) -> Result<HandlerKind, EnvelopeError> {
        match self.kind {
            APPLICATION_COMMAND => Ok(HandlerKind::Command),
            MESSAGE_COMPONENT => Ok(HandlerKind::Action),
            other => Err(EnvelopeError::UnsupportedType(other)),
        }
    }

    /// Translate the envelope into a transport-neutral invocation.
    pub fn to_invocation(&self) -> Result<Invocation, EnvelopeError> {
        let kind = self.handler_kind()?;
        let data = self.data.as_ref().ok_or(EnvelopeError::MissingData)?;

        let mut invocation = match kind {
            HandlerKind::Command => {
                let name = data.name.as_deref().ok_or(EnvelopeError::MissingField("name"))?;
                let mut invocation = Invocation::command(name);
                let mut options = &data.options;
                // Groups wrap exactly one subcommand.
                if let Some(group) = options.first().filter(|o| o.kind == SUB_COMMAND_GROUP) {
                    options = &group.options;
                }
                if let Some(sub) = options.first().filter(|o| o.kind == SUB_COMMAND) {
                    invocation = invocation.subcommand(sub.name.as_str());
                    options = &sub.options;
                }
                for option in options {
                    invocation = invocation.option(option.name.as_str(), option_value(option)?);
                }
                invocation
            }
            HandlerKind::Action => {
                let custom_id = data
                    .custom_id
                    .as_deref()
                    .ok_or(EnvelopeError::MissingField("custom_id"))?;
                Invocation::action(custom_id).values(data.values.iter().cloned())
            }
        };

        if let Some((id, display_name)) = self.caller() {
            invocation = invocation.caller(id, display_name);
        }
        Ok(invocation)
    }

    /// Caller id and display name: guild nickname, then global name, then
    /// username.
    fn caller(&self) -> Option<(String, String)> {
        let (user, nick) = match (&self.member, &self.user) {
            (Some(member), _) => (&member.user, member.nick.as_ref()),
            (None, Some(user)) => (user, None),
            (None, None) => return None,
        };
        let display_name = nick
            .or(user.global_name.as_ref())
            .unwrap_or(&user.username)
            .clone();
        Some((user.id.clone(), display_name))
    }
}

fn option_value(option: &CommandOptionData) -> Result<OptionValue, EnvelopeError> {
    let bad = || EnvelopeError::BadOption(option.name.clone());
    let value = option.value.as_ref().ok_or_else(bad)?;
    match value {
        Value::String(s) => Ok(OptionValue::String(s.clone())),
        Value::Bool(b) => Ok(OptionValue::Boolean(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(OptionValue::Integer(i)),
            None => n.as_f64().map(OptionValue::Number).ok_or_else(bad),
        },
        _ => Err(bad()),
    }
}

/// Initial response body for an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionCallback {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Reply>,
}

impl InteractionCallback {
    pub fn pong() -> Self {
        Self {
            kind: PONG,
            data: None,
        }
    }

    pub fn message(reply: Reply) -> Self {
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(reply),
        }
    }
}

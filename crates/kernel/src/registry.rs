use std::sync::Arc;

use anyhow::bail;
use thiserror::Error;

use crate::handler::{Handler, HandlerKind};

/// Resolution failures surfaced to the transport.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{kind} {name} not defined")]
    UnknownHandler { kind: HandlerKind, name: String },
}

/// The one name → handler table shared by every transport.
pub struct HandlerRegistry {
    commands: Vec<Arc<dyn Handler>>,
    actions: Vec<Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Register a handler under its name. Names are unique per kind.
    pub fn register(&mut self, handler: Arc<dyn Handler>) -> anyhow::Result<()> {
        let kind = handler.kind();
        if self.find(kind, handler.name()).is_some() {
            bail!("{} '{}' registered twice", kind, handler.name());
        }

        tracing::debug!(handler = handler.name(), %kind, "registered handler");
        match kind {
            HandlerKind::Command => self.commands.push(handler),
            HandlerKind::Action => self.actions.push(handler),
        }
        Ok(())
    }

    /// Resolve an exact command name or custom id.
    pub fn resolve(
        &self,
        kind: HandlerKind,
        name: &str,
    ) -> Result<Arc<dyn Handler>, DispatchError> {
        self.find(kind, name)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownHandler {
                kind,
                name: name.to_string(),
            })
    }

    fn find(&self, kind: HandlerKind, name: &str) -> Option<&Arc<dyn Handler>> {
        let table = match kind {
            HandlerKind::Command => &self.commands,
            HandlerKind::Action => &self.actions,
        };
        table.iter().find(|handler| handler.name() == name)
    }

    /// All registered handlers (commands first)
    pub fn handlers(&self) -> Vec<&Arc<dyn Handler>> {
        let mut all = Vec::new();
        all.extend(self.commands.iter());
        all.extend(self.actions.iter());
        all
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Platform definitions of every command, in registration order.
    pub fn command_definitions(&self) -> Vec<serde_json::Value> {
        self.commands
            .iter()
            .filter_map(|handler| handler.definition())
            .collect()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerCtx, HandlerError, Invocation, Response};
    use crate::reply::Reply;
    use async_trait::async_trait;
    use serde_json::json;

    struct TestHandler {
        name: &'static str,
        kind: HandlerKind,
    }

    #[async_trait]
    impl Handler for TestHandler {
        fn name(&self) -> &'static str {
            self.name
        }

        fn kind(&self) -> HandlerKind {
            self.kind
        }

        fn definition(&self) -> Option<serde_json::Value> {
            (self.kind == HandlerKind::Command).then(|| json!({ "name": self.name }))
        }

        async fn handle(
            &self,
            _ctx: &HandlerCtx,
            _invocation: Invocation,
        ) -> Result<Response, HandlerError> {
            Ok(Response::Immediate(Reply::text(self.name)))
        }
    }

    fn handler(name: &'static str, kind: HandlerKind) -> Arc<dyn Handler> {
        Arc::new(TestHandler { name, kind })
    }

    #[test]
    fn test_registry_creation() {
        let registry = HandlerRegistry::new();
        assert!(registry.handlers().is_empty());
        assert!(registry.command_definitions().is_empty());
    }

    #[test]
    fn test_resolve_by_kind_and_name() {
        let mut registry = HandlerRegistry::new();
        registry.register(handler("vote", HandlerKind::Command)).unwrap();
        registry.register(handler("book_vote", HandlerKind::Action)).unwrap();

        assert_eq!(
            registry.resolve(HandlerKind::Command, "vote").unwrap().name(),
            "vote"
        );
        assert_eq!(
            registry
                .resolve(HandlerKind::Action, "book_vote")
                .unwrap()
                .name(),
            "book_vote"
        );
        assert_eq!(registry.command_count(), 1);
        assert_eq!(registry.action_count(), 1);
    }

    #[test]
    fn test_unknown_name_fails() {
        let mut registry = HandlerRegistry::new();
        registry.register(handler("vote", HandlerKind::Command)).unwrap();

        let err = registry
            .resolve(HandlerKind::Action, "vote")
            .err()
            .unwrap();
        assert_eq!(
            err,
            DispatchError::UnknownHandler {
                kind: HandlerKind::Action,
                name: "vote".to_string()
            }
        );
        assert_eq!(err.to_string(), "action vote not defined");
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register(handler("vote", HandlerKind::Command)).unwrap();
        assert!(registry.register(handler("vote", HandlerKind::Command)).is_err());
        assert!(registry.register(handler("vote", HandlerKind::Action)).is_ok());
    }

    #[test]
    fn test_definitions_only_cover_commands() {
        let mut registry = HandlerRegistry::new();
        registry.register(handler("test", HandlerKind::Command)).unwrap();
        registry.register(handler("book_vote", HandlerKind::Action)).unwrap();

        assert_eq!(registry.command_definitions(), vec![json!({"name": "test"})]);
    }
}

//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use bookclub_kernel::{
    Book, BookLookup, ClubState, ClubStore, Dispatcher, HandlerKind, Invocation, LookupError,
    Reply, Responder, SnapshotSink,
};

pub fn book(id: &str, title: &str, author: &str, url: &str) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        url: url.to_string(),
    }
}

/// Holds a lookup open until the test releases it.
#[derive(Clone, Default)]
pub struct LookupGate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// Provider answering from a fixed table keyed by link.
#[derive(Default)]
pub struct FakeLookup {
    pub books: HashMap<String, Book>,
    pub fail: bool,
    pub gate: Option<LookupGate>,
}

impl FakeLookup {
    pub fn with(mut self, book: Book) -> Self {
        self.books.insert(book.url.clone(), book);
        self
    }

    pub fn gated(mut self, gate: LookupGate) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl BookLookup for FakeLookup {
    async fn lookup(&self, url: &str) -> Result<Option<Book>, LookupError> {
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        if self.fail {
            return Err(LookupError::Network("connection refused".to_string()));
        }
        Ok(self.books.get(url).cloned())
    }

    async fn search(&self, query: &str) -> Result<Vec<Book>, LookupError> {
        if self.fail {
            return Err(LookupError::Network("connection refused".to_string()));
        }
        let query = query.to_lowercase();
        let mut found: Vec<Book> = self
            .books
            .values()
            .filter(|book| book.title.to_lowercase().contains(&query))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<ClubState>>,
}

#[async_trait]
impl SnapshotSink for MemorySink {
    async fn save(&self, state: &ClubState) -> anyhow::Result<()> {
        self.saved.lock().unwrap().push(state.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingResponder {
    pub sent: Vec<Reply>,
    pub edits: Vec<Reply>,
}

impl RecordingResponder {
    /// Content the user ends up seeing.
    pub fn last_content(&self) -> &str {
        self.edits
            .last()
            .or(self.sent.last())
            .map(|reply| reply.content.as_str())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn send(&mut self, reply: Reply) -> anyhow::Result<()> {
        self.sent.push(reply);
        Ok(())
    }

    async fn edit(&mut self, reply: Reply) -> anyhow::Result<()> {
        self.edits.push(reply);
        Ok(())
    }
}

pub struct Club {
    pub dispatcher: Dispatcher,
    pub sink: Arc<MemorySink>,
}

impl Club {
    pub fn new(lookup: FakeLookup) -> Self {
        Self::with_state(lookup, ClubState::default())
    }

    pub fn with_state(lookup: FakeLookup, state: ClubState) -> Self {
        let sink = Arc::new(MemorySink::default());
        let dispatcher =
            bookclub_app::build_dispatcher(ClubStore::new(state), Arc::new(lookup), sink.clone())
                .unwrap();
        Self { dispatcher, sink }
    }

    pub async fn invoke(&self, invocation: Invocation) -> RecordingResponder {
        let handler = self
            .dispatcher
            .resolve(invocation.kind, &invocation.name)
            .unwrap();
        let mut responder = RecordingResponder::default();
        self.dispatcher.run(handler, invocation, &mut responder).await;
        responder
    }

    pub async fn state(&self) -> ClubState {
        self.dispatcher.store().snapshot().await
    }

    pub fn saves(&self) -> usize {
        self.sink.saved.lock().unwrap().len()
    }
}

pub fn cast(user: &str, name: &str, values: &[&str]) -> Invocation {
    let invocation = Invocation::action("book_vote")
        .caller(user, name)
        .values(values.iter().copied());
    assert_eq!(invocation.kind, HandlerKind::Action);
    invocation
}

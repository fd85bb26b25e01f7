//! Book club application library
//!
//! Command and action handlers, the metadata provider, and shared helpers.

pub mod modules;
pub mod provider;
pub mod utils;

use std::sync::Arc;

use bookclub_kernel::{
    BookLookup, ClubStore, Dispatcher, HandlerCtx, HandlerRegistry, SnapshotSink,
};

/// Registry holding every handler of the application.
pub fn registry() -> anyhow::Result<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();
    modules::register_all(&mut registry)?;
    Ok(registry)
}

/// Wire the application handlers to a store, a provider, and a snapshot sink.
pub fn build_dispatcher(
    store: ClubStore,
    lookup: Arc<dyn BookLookup>,
    snapshots: Arc<dyn SnapshotSink>,
) -> anyhow::Result<Dispatcher> {
    let ctx = HandlerCtx { store, lookup };
    Ok(Dispatcher::new(registry()?, ctx, snapshots))
}

//! Core of the book club bot: club state, handler contract, registry, and
//! dispatch shared by every transport.

pub mod club;
pub mod dispatch;
pub mod handler;
pub mod interaction;
pub mod lookup;
pub mod registry;
pub mod reply;
pub mod settings;
pub mod store;

pub use club::{Ballot, Book, ClubState, Event, Shortlist, TallyEntry, UserId, Vote};
pub use dispatch::{Dispatcher, Responder};
pub use handler::{
    Caller, Handler, HandlerCtx, HandlerError, HandlerKind, Invocation, OptionValue, Response,
};
pub use lookup::{BookLookup, LookupError};
pub use registry::{DispatchError, HandlerRegistry};
pub use reply::Reply;
pub use store::{ClubStore, SnapshotSink};

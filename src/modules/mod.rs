//! Command and action handlers of the book club.

pub mod book_vote;
pub mod bookevent;
pub mod ping;
pub mod search;
pub mod shortlist;
pub mod vote;

use bookclub_kernel::HandlerRegistry;

/// Register every command and action handler with the registry
pub fn register_all(registry: &mut HandlerRegistry) -> anyhow::Result<()> {
    registry.register(ping::create_handler())?;
    registry.register(search::create_handler())?;
    registry.register(shortlist::create_handler())?;
    registry.register(vote::create_handler())?;
    registry.register(bookevent::create_handler())?;
    registry.register(book_vote::create_handler())?;
    Ok(())
}

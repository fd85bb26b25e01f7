//! Metadata providers implementing `BookLookup`.

pub mod openlibrary;

pub use openlibrary::OpenLibraryClient;

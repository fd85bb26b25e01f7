//! Club state: the shortlist, the active vote, and scheduled events.
//!
//! `ClubState` is the single aggregate mutated by handlers and written to the
//! snapshot file after every dispatched request.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Platform-assigned identity of a chat user.
pub type UserId = String;

/// A book as resolved by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Provider-assigned stable identifier
    pub id: String,
    pub title: String,
    pub author: String,
    /// Canonical link to the provider record
    pub url: String,
}

impl Book {
    /// `"{title} by {author} ({url})"`
    pub fn describe(&self) -> String {
        format!("{} by {} ({})", self.title, self.author, self.url)
    }
}

/// Ordered candidate books. Position determines the 1-based entry number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortlist {
    #[serde(default)]
    pub books: Vec<Book>,
}

impl Shortlist {
    pub fn add(&mut self, book: Book) {
        self.books.push(book);
    }

    /// Remove the book at a 1-based entry number. Out-of-range numbers leave
    /// the list untouched.
    pub fn remove_entry(&mut self, entry_number: i64) -> Option<Book> {
        remove_entry(&mut self.books, entry_number)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// One user's selection of one book in the active vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub book: Book,
    pub user: UserId,
}

/// Count of ballots for one nominee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyEntry {
    pub book: Book,
    pub votes: usize,
}

impl TallyEntry {
    /// `"{title} by {author}: {n} vote(s)"`
    pub fn render(&self) -> String {
        let noun = if self.votes == 1 { "vote" } else { "votes" };
        format!(
            "{} by {}: {} {}",
            self.book.title, self.book.author, self.votes, noun
        )
    }
}

/// A poll over a frozen copy of the shortlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub votes: Vec<Ballot>,
}

impl Vote {
    /// Replace every ballot of `user` with one ballot per selected id that
    /// names a nominee. Unknown ids are dropped.
    pub fn cast<S: AsRef<str>>(&mut self, user: &str, selected: &[S]) {
        self.votes.retain(|ballot| ballot.user != user);

        for book_id in selected {
            let book_id = book_id.as_ref();
            let Some(book) = self.books.iter().find(|book| book.id == book_id) else {
                tracing::debug!(
                    user = %user,
                    book_id = %book_id,
                    "ignoring ballot for unknown book"
                );
                continue;
            };
            let already_cast = self
                .votes
                .iter()
                .any(|ballot| ballot.user == user && ballot.book.id == book.id);
            if !already_cast {
                self.votes.push(Ballot {
                    book: book.clone(),
                    user: user.to_string(),
                });
            }
        }
    }

    /// Ballot counts per nominee, in nominee order.
    pub fn tally(&self) -> Vec<TallyEntry> {
        self.books
            .iter()
            .map(|book| TallyEntry {
                book: book.clone(),
                votes: self
                    .votes
                    .iter()
                    .filter(|ballot| ballot.book.id == book.id)
                    .count(),
            })
            .collect()
    }
}

/// A scheduled discussion of one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub book: Book,
}

/// Minimum shortlist size before a vote may start.
pub const MIN_VOTE_CANDIDATES: usize = 2;

/// Root aggregate persisted as the snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubState {
    #[serde(default)]
    pub shortlist: Shortlist,
    #[serde(default)]
    pub vote: Vote,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl ClubState {
    /// Start a new vote over a copy of the current shortlist, discarding any
    /// previous ballots. Returns `None` without touching the vote when the
    /// shortlist is too short.
    pub fn start_vote(&mut self) -> Option<&Vote> {
        if self.shortlist.len() < MIN_VOTE_CANDIDATES {
            return None;
        }
        self.vote = Vote {
            books: self.shortlist.books.clone(),
            votes: Vec::new(),
        };
        Some(&self.vote)
    }

    pub fn add_event(&mut self, date: OffsetDateTime, book: Book) {
        self.events.push(Event { date, book });
    }

    /// Remove the event at a 1-based entry number.
    pub fn remove_event(&mut self, entry_number: i64) -> Option<Event> {
        remove_entry(&mut self.events, entry_number)
    }
}

fn remove_entry<T>(items: &mut Vec<T>, entry_number: i64) -> Option<T> {
    let index = usize::try_from(entry_number.checked_sub(1)?).ok()?;
    if index < items.len() {
        Some(items.remove(index))
    } else {
        None
    }
}

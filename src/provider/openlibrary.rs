//! Open Library client
//!
//! Resolves work and edition links (`/works/OL…W`, `/books/OL…M`) and runs
//! free-text searches against the public JSON API.

use std::time::Duration;

use async_trait::async_trait;
use bookclub_kernel::settings::LookupSettings;
use bookclub_kernel::{Book, BookLookup, LookupError};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const USER_AGENT: &str = concat!("bookclub/", env!("CARGO_PKG_VERSION"));
const UNKNOWN_AUTHOR: &str = "Unknown author";
const SEARCH_FIELDS: &str = "key,title,author_name";

/// Record kinds a book link can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordKind {
    Work,
    Edition,
}

impl RecordKind {
    fn collection(self) -> &'static str {
        match self {
            RecordKind::Work => "works",
            RecordKind::Edition => "books",
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkRecord {
    title: String,
    #[serde(default)]
    authors: Vec<WorkAuthor>,
}

#[derive(Debug, Deserialize)]
struct WorkAuthor {
    author: AuthorRef,
}

#[derive(Debug, Deserialize)]
struct EditionRecord {
    title: String,
    #[serde(default)]
    authors: Vec<AuthorRef>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct AuthorRecord {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    key: String,
    title: String,
    #[serde(default)]
    author_name: Vec<String>,
}

pub struct OpenLibraryClient {
    http_client: reqwest::Client,
    base_url: String,
    search_limit: usize,
}

impl OpenLibraryClient {
    pub fn new(settings: &LookupSettings) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            search_limit: settings.search_limit,
        })
    }

    /// Canonical link of a record.
    fn record_url(&self, kind: RecordKind, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind.collection(), id)
    }

    /// GET a JSON document; `None` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, LookupError> {
        tracing::debug!(url = %url, "querying Open Library");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| LookupError::Parse(e.to_string()))
    }

    async fn author_name(&self, authors: &[AuthorRef]) -> Result<String, LookupError> {
        let Some(author) = authors.first() else {
            return Ok(UNKNOWN_AUTHOR.to_string());
        };
        let url = format!("{}{}.json", self.base_url, author.key);
        Ok(self
            .get_json::<AuthorRecord>(&url, &[])
            .await?
            .map(|record| record.name)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()))
    }
}

/// Extract the record kind and id from a book link. Only the path is
/// inspected, so mirrors and locale subdomains resolve too.
fn parse_record_link(link: &str) -> Option<(RecordKind, String)> {
    let url = Url::parse(link.trim()).ok()?;
    let mut segments = url.path_segments()?;
    let kind = match segments.next()? {
        "works" => RecordKind::Work,
        "books" => RecordKind::Edition,
        _ => return None,
    };
    let id = segments.next()?.trim_end_matches(".json");
    let suffix = match kind {
        RecordKind::Work => 'W',
        RecordKind::Edition => 'M',
    };
    let valid = id.starts_with("OL") && id.ends_with(suffix) && id.len() > 3;
    valid.then(|| (kind, id.to_string()))
}

#[async_trait]
impl BookLookup for OpenLibraryClient {
    async fn lookup(&self, link: &str) -> Result<Option<Book>, LookupError> {
        let Some((kind, id)) = parse_record_link(link) else {
            tracing::debug!(link = %link, "not an Open Library record link");
            return Ok(None);
        };

        let record_url = self.record_url(kind, &id);
        let json_url = format!("{record_url}.json");
        let (title, authors) = match kind {
            RecordKind::Work => {
                let Some(work) = self.get_json::<WorkRecord>(&json_url, &[]).await? else {
                    return Ok(None);
                };
                let authors = work.authors.into_iter().map(|a| a.author).collect::<Vec<_>>();
                (work.title, authors)
            }
            RecordKind::Edition => {
                let Some(edition) = self.get_json::<EditionRecord>(&json_url, &[]).await? else {
                    return Ok(None);
                };
                (edition.title, edition.authors)
            }
        };

        let author = self.author_name(&authors).await?;
        Ok(Some(Book {
            id,
            title,
            author,
            url: record_url,
        }))
    }

    async fn search(&self, query: &str) -> Result<Vec<Book>, LookupError> {
        let url = format!("{}/search.json", self.base_url);
        let limit = self.search_limit.to_string();
        let response = self
            .get_json::<SearchResponse>(
                &url,
                &[("q", query), ("limit", limit.as_str()), ("fields", SEARCH_FIELDS)],
            )
            .await?
            .unwrap_or(SearchResponse { docs: Vec::new() });

        Ok(response
            .docs
            .into_iter()
            .take(self.search_limit)
            .filter_map(|doc| {
                let id = doc.key.rsplit('/').next()?.to_string();
                Some(Book {
                    url: self.record_url(RecordKind::Work, &id),
                    id,
                    title: doc.title,
                    author: doc
                        .author_name
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                })
            })
            .collect())
    }
}

//! Search model: queries, result items and filtered result sets.

/// Page rendering for result sets.
pub mod pager;
/// Compact selection tokens carried in callback data.
pub mod token;

pub use pager::{page_count, render_page, Button, PageView};
pub use token::{SelectionToken, TokenError};

use crate::config::{
    ARTIST_QUERY_MAX_WORDS, ARTIST_QUERY_SUFFIX, MAX_RESULTS, SONG_KEYWORDS, TITLE_DENYLIST,
};
use serde::{Deserialize, Serialize};

/// How a query is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    /// Short query without song keywords, treated as an artist name
    Artist,
    /// Longer query or one naming a song explicitly
    Track,
}

/// A classified user query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    text: String,
    kind: QueryKind,
}

impl Query {
    /// Trim and classify a raw user query.
    ///
    /// # Examples
    ///
    /// ```
    /// use songseek_core::search::{Query, QueryKind};
    /// assert_eq!(Query::new("Adele").kind(), QueryKind::Artist);
    /// assert_eq!(Query::new("Adele song").kind(), QueryKind::Track);
    /// ```
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_string();
        let kind = classify(&text);
        Self { text, kind }
    }

    /// The trimmed query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The classification made at construction.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        self.kind
    }

    /// String sent to the extractor; artist queries get a catalog suffix.
    #[must_use]
    pub fn search_text(&self) -> String {
        match self.kind {
            QueryKind::Artist => format!("{} {ARTIST_QUERY_SUFFIX}", self.text),
            QueryKind::Track => self.text.clone(),
        }
    }
}

fn classify(text: &str) -> QueryKind {
    let lowered = text.to_lowercase();
    let has_keyword = SONG_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    let words = text.split_whitespace().count();

    if !has_keyword && words < ARTIST_QUERY_MAX_WORDS {
        QueryKind::Artist
    } else {
        QueryKind::Track
    }
}

/// One candidate track returned by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Platform resource identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Duration in whole seconds, when known
    pub duration: Option<u64>,
}

/// Ordered, filtered and capped list of tracks for one search.
///
/// The generation is stamped when the set is stored in a session and is
/// embedded in every token minted for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    items: Vec<TrackInfo>,
    generation: u32,
}

impl ResultSet {
    /// Filter raw extractor output and cap it to `MAX_RESULTS`, preserving rank order.
    #[must_use]
    pub fn from_raw(raw: Vec<TrackInfo>) -> Self {
        Self {
            items: filter_results(raw),
            generation: 0,
        }
    }

    /// Stamp the set with a generation.
    #[must_use]
    pub fn with_generation(mut self, generation: u32) -> Self {
        self.generation = generation;
        self
    }

    /// Generation of this set.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Items in rank order.
    #[must_use]
    pub fn items(&self) -> &[TrackInfo] {
        &self.items
    }

    /// Item at an absolute index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TrackInfo> {
        self.items.get(index)
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Returns true if the title contains a denylisted fragment.
#[must_use]
pub fn is_denied_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    TITLE_DENYLIST.iter().any(|word| lowered.contains(word))
}

/// Drop denylisted titles and keep at most `MAX_RESULTS` items.
///
/// Idempotent: filtering an already filtered list returns it unchanged.
#[must_use]
pub fn filter_results(raw: Vec<TrackInfo>) -> Vec<TrackInfo> {
    raw.into_iter()
        .filter(|track| !is_denied_title(&track.title))
        .take(MAX_RESULTS)
        .collect()
}

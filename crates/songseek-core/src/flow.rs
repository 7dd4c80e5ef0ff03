//! Search, pagination and download workflow.
//!
//! State machine per conversation:
//!
//! ```text
//! Idle --/search--> AwaitingQuery --text--> ResultsShown --next/prev--> ResultsShown
//!                                                         --download--> Downloading --> ResultsShown
//!                                                         --text--> (new search)
//! ```
//!
//! `/search` only changes the phase, so buttons already on screen keep
//! working until the next query replaces the result set. Empty results and
//! search failures clear the session back to Idle. Rejected selections
//! leave the session untouched.

use crate::config::{FlowSettings, CAPTION_TITLE_MAX_CHARS};
use crate::extractor::{ErrorKind, Extractor};
use crate::search::{page_count, render_page, Query, ResultSet, SelectionToken, TrackInfo};
use crate::session::{Phase, Session, SessionId, SessionStore};
use crate::transport::ChatTransport;
use crate::utils::truncate_str;
use anyhow::Result;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Prompt sent when a search starts
pub const MSG_PROMPT: &str = "🎵 Enter a song title or an artist name:";
/// Sent while a search runs
pub const MSG_SEARCHING: &str = "🔍 Searching...";
/// Sent when filtering left nothing
pub const MSG_NOTHING_FOUND: &str = "❌ Nothing found.";
/// Sent when the search call failed
pub const MSG_SEARCH_FAILED: &str = "⚠️ Search failed. Please try again.";
/// Sent for malformed, stale or out-of-range selections
pub const MSG_INVALID_SELECTION: &str = "❌ Invalid selection.";
/// Sent when download or delivery failed
pub const MSG_DOWNLOAD_FAILED: &str = "⚠️ Failed to download the audio. Please try again.";
/// Sent when the platform refuses the track for good
pub const MSG_TRACK_UNAVAILABLE: &str = "❌ This track is unavailable. Please pick another one.";

/// Why a selection was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Callback data did not decode
    Malformed,
    /// No result set is active for the conversation
    NoActiveSearch,
    /// Token was minted for an older result set
    Stale,
    /// Index or page outside the active result set
    OutOfRange,
}

/// Result of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Event does not apply to the current phase
    Ignored,
    /// User was (re-)prompted for a query
    Prompted,
    /// A result page was rendered
    Shown {
        /// Rendered page
        page: usize,
    },
    /// Search returned nothing after filtering; session cleared
    NothingFound,
    /// Search call failed; session cleared
    SearchFailed,
    /// Selection rejected; session unchanged
    Rejected(RejectReason),
    /// Audio delivered
    Delivered,
    /// Download or delivery failed; session kept
    DownloadFailed,
}

/// Drives the search/select/download workflow for all conversations
pub struct SearchFlow {
    extractor: Arc<dyn Extractor>,
    sessions: Arc<dyn SessionStore>,
    search_limit: usize,
    generation: AtomicU32,
}

impl SearchFlow {
    /// Create a workflow over an extractor and a session store.
    #[must_use]
    pub fn new(
        extractor: Arc<dyn Extractor>,
        sessions: Arc<dyn SessionStore>,
        settings: &FlowSettings,
    ) -> Self {
        Self {
            extractor,
            sessions,
            search_limit: settings.effective_search_limit(),
            generation: AtomicU32::new(1),
        }
    }

    fn next_generation(&self) -> u32 {
        self.generation.fetch_add(1, Ordering::Relaxed)
    }

    /// Current session of a conversation.
    pub async fn session(&self, id: SessionId) -> Session {
        self.sessions.get(id).await
    }

    /// Enter `AwaitingQuery` and prompt for a query. Results already on
    /// screen stay selectable.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be sent.
    pub async fn begin_search(
        &self,
        id: SessionId,
        transport: &dyn ChatTransport,
    ) -> Result<FlowOutcome> {
        let mut session = self.sessions.get(id).await;
        session.phase = Phase::AwaitingQuery;
        self.sessions.put(id, session).await;
        transport.send_text(MSG_PROMPT).await?;
        Ok(FlowOutcome::Prompted)
    }

    /// Handle a text message as a query. Acts while awaiting a query or
    /// while results are shown; a new search replaces the result set.
    ///
    /// # Errors
    ///
    /// Returns an error if a message cannot be sent.
    pub async fn handle_query(
        &self,
        id: SessionId,
        text: &str,
        transport: &dyn ChatTransport,
    ) -> Result<FlowOutcome> {
        let phase = self.sessions.get(id).await.phase;
        if !matches!(phase, Phase::AwaitingQuery | Phase::ResultsShown) {
            return Ok(FlowOutcome::Ignored);
        }

        let query = Query::new(text);
        if query.text().is_empty() {
            transport.send_text(MSG_PROMPT).await?;
            return Ok(FlowOutcome::Prompted);
        }

        transport.send_text(MSG_SEARCHING).await?;
        info!(session_id = id, query = %query.text(), kind = ?query.kind(), "Searching");

        let raw = match self
            .extractor
            .search(&query.search_text(), self.search_limit)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                error!(session_id = id, error = %e, "Search failed");
                self.sessions.clear(id).await;
                transport.send_text(MSG_SEARCH_FAILED).await?;
                return Ok(FlowOutcome::SearchFailed);
            }
        };

        let results = ResultSet::from_raw(raw);
        if results.is_empty() {
            info!(session_id = id, "Search returned no usable results");
            self.sessions.clear(id).await;
            transport.send_text(MSG_NOTHING_FOUND).await?;
            return Ok(FlowOutcome::NothingFound);
        }

        let results = results.with_generation(self.next_generation());
        let view = render_page(&results, 0, query.kind());
        debug!(session_id = id, results = results.len(), generation = results.generation(), "Showing results");
        self.sessions
            .put(id, Session::results_shown(results, query, 0))
            .await;
        transport.send_page(&view).await?;
        Ok(FlowOutcome::Shown { page: 0 })
    }

    /// Handle callback data from a pressed button.
    ///
    /// # Errors
    ///
    /// Returns an error if a message cannot be sent or edited.
    pub async fn handle_callback(
        &self,
        id: SessionId,
        data: &str,
        transport: &dyn ChatTransport,
    ) -> Result<FlowOutcome> {
        let token = match SelectionToken::decode(data) {
            Ok(token) => token,
            Err(e) => {
                warn!(session_id = id, error = %e, "Malformed callback data");
                return self.reject(RejectReason::Malformed, transport).await;
            }
        };

        let session = self.sessions.get(id).await;
        if !session.has_results() {
            return self.reject(RejectReason::NoActiveSearch, transport).await;
        }
        if token.generation() != session.results.generation() {
            debug!(
                session_id = id,
                token_generation = token.generation(),
                active_generation = session.results.generation(),
                "Stale selection token"
            );
            return self.reject(RejectReason::Stale, transport).await;
        }

        match token {
            SelectionToken::Next { page, .. } | SelectionToken::Prev { page, .. } => {
                self.show_page(id, session, page as usize, transport).await
            }
            SelectionToken::Download { index, .. } => {
                let Some(track) = session.results.get(index as usize).cloned() else {
                    return self.reject(RejectReason::OutOfRange, transport).await;
                };
                self.download(id, session, &track, transport).await
            }
        }
    }

    async fn show_page(
        &self,
        id: SessionId,
        mut session: Session,
        page: usize,
        transport: &dyn ChatTransport,
    ) -> Result<FlowOutcome> {
        if page >= page_count(session.results.len()) {
            return self.reject(RejectReason::OutOfRange, transport).await;
        }
        let Some(kind) = session.query.as_ref().map(Query::kind) else {
            return self.reject(RejectReason::NoActiveSearch, transport).await;
        };

        let view = render_page(&session.results, page, kind);
        transport.edit_page(&view).await?;
        session.page = page;
        self.sessions.put(id, session).await;
        Ok(FlowOutcome::Shown { page })
    }

    async fn download(
        &self,
        id: SessionId,
        mut session: Session,
        track: &TrackInfo,
        transport: &dyn ChatTransport,
    ) -> Result<FlowOutcome> {
        transport
            .send_text(&format!("⏳ Downloading: {}", track.title))
            .await?;

        let resume = session.phase;
        session.phase = Phase::Downloading;
        self.sessions.put(id, session.clone()).await;

        let outcome = self.download_and_deliver(id, track, transport).await;

        session.phase = resume;
        self.sessions.put(id, session).await;
        outcome
    }

    async fn download_and_deliver(
        &self,
        id: SessionId,
        track: &TrackInfo,
        transport: &dyn ChatTransport,
    ) -> Result<FlowOutcome> {
        info!(session_id = id, track_id = %track.id, "Downloading track");
        let audio = match self.extractor.download(&track.id).await {
            Ok(audio) => audio,
            Err(e) => {
                error!(session_id = id, track_id = %track.id, kind = ?e.kind(), error = %e, "Download failed");
                let message = if e.kind() == ErrorKind::Fatal {
                    MSG_TRACK_UNAVAILABLE
                } else {
                    MSG_DOWNLOAD_FAILED
                };
                transport.send_text(message).await?;
                return Ok(FlowOutcome::DownloadFailed);
            }
        };

        let title = if audio.title().trim().is_empty() {
            track.title.as_str()
        } else {
            audio.title()
        };
        let caption = truncate_str(title, CAPTION_TITLE_MAX_CHARS);
        let delivery = transport.send_audio(audio.path(), &caption).await;

        if let Err(e) = audio.remove().await {
            warn!(session_id = id, error = %e, "Failed to remove downloaded file");
        }

        match delivery {
            Ok(()) => {
                info!(session_id = id, track_id = %track.id, "Audio delivered");
                Ok(FlowOutcome::Delivered)
            }
            Err(e) => {
                error!(session_id = id, track_id = %track.id, error = %e, "Audio delivery failed");
                transport.send_text(MSG_DOWNLOAD_FAILED).await?;
                Ok(FlowOutcome::DownloadFailed)
            }
        }
    }

    async fn reject(
        &self,
        reason: RejectReason,
        transport: &dyn ChatTransport,
    ) -> Result<FlowOutcome> {
        transport.send_text(MSG_INVALID_SELECTION).await?;
        Ok(FlowOutcome::Rejected(reason))
    }
}

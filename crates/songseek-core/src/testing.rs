//! Testing helpers and mock utilities.
//!
//! Provides fixtures for search results and a recording chat transport.

use crate::search::{PageView, TrackInfo};
use crate::transport::MockChatTransport;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// `n` raw search results with ids `id0..` and titles `Track 0..`.
#[must_use]
pub fn raw_tracks(n: usize) -> Vec<TrackInfo> {
    (0..n)
        .map(|i| TrackInfo {
            id: format!("id{i}"),
            title: format!("Track {i}"),
            duration: Some(180 + i as u64),
        })
        .collect()
}

/// Everything a recording transport was asked to do.
#[derive(Debug, Default)]
pub struct TransportLog {
    /// Plain text messages
    pub texts: Vec<String>,
    /// Pages sent as new messages
    pub sent_pages: Vec<PageView>,
    /// Pages edited in place
    pub edited_pages: Vec<PageView>,
    /// Delivered audio files with their captions
    pub audio: Vec<(PathBuf, String)>,
}

/// Create a mock transport that succeeds and records every call.
///
/// # Example
///
/// ```rust,ignore
/// let (transport, log) = recording_transport();
/// flow.begin_search(1, &transport).await?;
/// assert_eq!(log.lock().unwrap().texts.len(), 1);
/// ```
#[must_use]
pub fn recording_transport() -> (MockChatTransport, Arc<Mutex<TransportLog>>) {
    let log = Arc::new(Mutex::new(TransportLog::default()));
    let mut mock = MockChatTransport::new();

    let texts = log.clone();
    mock.expect_send_text().returning(move |text| {
        if let Ok(mut log) = texts.lock() {
            log.texts.push(text.to_string());
        }
        Ok(())
    });

    let sent = log.clone();
    mock.expect_send_page().returning(move |view| {
        if let Ok(mut log) = sent.lock() {
            log.sent_pages.push(view.clone());
        }
        Ok(())
    });

    let edited = log.clone();
    mock.expect_edit_page().returning(move |view| {
        if let Ok(mut log) = edited.lock() {
            log.edited_pages.push(view.clone());
        }
        Ok(())
    });

    let audio = log.clone();
    mock.expect_send_audio().returning(move |path, caption| {
        if let Ok(mut log) = audio.lock() {
            log.audio.push((path.to_path_buf(), caption.to_string()));
        }
        Ok(())
    });

    (mock, log)
}

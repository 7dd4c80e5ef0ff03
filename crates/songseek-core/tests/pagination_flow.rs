use anyhow::Result;
use songseek_core::config::FlowSettings;
use songseek_core::extractor::{DownloadedAudio, ExtractError, Extractor};
use songseek_core::flow::{FlowOutcome, RejectReason, SearchFlow, MSG_INVALID_SELECTION, MSG_NOTHING_FOUND};
use songseek_core::search::{PageView, SelectionToken, TrackInfo};
use songseek_core::session::{InMemorySessionStore, Phase, SessionStore};
use songseek_core::transport::ChatTransport;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct FakeExtractor {
    results: Vec<TrackInfo>,
    download_dir: PathBuf,
    downloads: AtomicUsize,
}

impl FakeExtractor {
    fn new(titles: &[&str], download_dir: &Path) -> Self {
        Self {
            results: titles
                .iter()
                .enumerate()
                .map(|(i, title)| TrackInfo {
                    id: format!("vid{i}"),
                    title: (*title).to_string(),
                    duration: Some(200),
                })
                .collect(),
            download_dir: download_dir.to_path_buf(),
            downloads: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Extractor for FakeExtractor {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<TrackInfo>, ExtractError> {
        Ok(self.results.iter().take(limit).cloned().collect())
    }

    async fn download(&self, id: &str) -> Result<DownloadedAudio, ExtractError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let track = self
            .results
            .iter()
            .find(|t| t.id == id)
            .ok_or(ExtractError::MissingOutput)?;
        let path = self.download_dir.join(format!("{id}.mp3"));
        std::fs::write(&path, b"ID3")?;
        Ok(DownloadedAudio::new(path, track.title.clone()))
    }
}

#[derive(Default)]
struct FakeTransport {
    texts: Mutex<Vec<String>>,
    pages: Mutex<Vec<PageView>>,
    audio: Mutex<Vec<(PathBuf, String, bool)>>,
    fail_audio: bool,
}

impl FakeTransport {
    fn last_page(&self) -> PageView {
        self.pages
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("a page was rendered")
    }

    fn last_text(&self) -> Option<String> {
        self.texts.lock().expect("lock").last().cloned()
    }
}

#[async_trait::async_trait]
impl ChatTransport for FakeTransport {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.texts.lock().expect("lock").push(text.to_string());
        Ok(())
    }

    async fn send_page(&self, view: &PageView) -> Result<()> {
        self.pages.lock().expect("lock").push(view.clone());
        Ok(())
    }

    async fn edit_page(&self, view: &PageView) -> Result<()> {
        self.pages.lock().expect("lock").push(view.clone());
        Ok(())
    }

    async fn send_audio(&self, path: &Path, caption: &str) -> Result<()> {
        self.audio
            .lock()
            .expect("lock")
            .push((path.to_path_buf(), caption.to_string(), path.exists()));
        if self.fail_audio {
            anyhow::bail!("upload rejected");
        }
        Ok(())
    }
}

const SEVEN: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

fn setup(titles: &[&str], dir: &Path) -> (SearchFlow, Arc<FakeExtractor>, Arc<InMemorySessionStore>) {
    let extractor = Arc::new(FakeExtractor::new(titles, dir));
    let store = Arc::new(InMemorySessionStore::new(3600, 100));
    let flow = SearchFlow::new(extractor.clone(), store.clone(), &FlowSettings::default());
    (flow, extractor, store)
}

fn labels(view: &PageView) -> Vec<String> {
    view.buttons().map(|b| b.label.clone()).collect()
}

fn button_data(view: &PageView, label: &str) -> String {
    view.buttons()
        .find(|b| b.label == label)
        .map(|b| b.token.encode())
        .expect("button present")
}

#[tokio::test]
async fn test_seven_results_paginate_forward_and_back() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (flow, _, store) = setup(&SEVEN, dir.path());
    let transport = FakeTransport::default();

    flow.begin_search(42, &transport).await?;
    let outcome = flow.handle_query(42, "some song", &transport).await?;
    assert_eq!(outcome, FlowOutcome::Shown { page: 0 });

    let first = transport.last_page();
    assert!(first.text.contains("page 1 of 2"));
    assert_eq!(
        labels(&first),
        vec!["A 3:20", "B 3:20", "C 3:20", "D 3:20", "E 3:20", "➡"]
    );

    let outcome = flow
        .handle_callback(42, &button_data(&first, "➡"), &transport)
        .await?;
    assert_eq!(outcome, FlowOutcome::Shown { page: 1 });
    let second = transport.last_page();
    assert!(second.text.contains("page 2 of 2"));
    assert_eq!(labels(&second), vec!["F 3:20", "G 3:20", "⬅"]);
    assert_eq!(store.get(42).await.page, 1);

    flow.handle_callback(42, &button_data(&second, "⬅"), &transport)
        .await?;
    assert_eq!(transport.last_page(), first);
    assert_eq!(store.get(42).await.phase, Phase::ResultsShown);
    Ok(())
}

#[tokio::test]
async fn test_empty_results_then_stray_token_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (flow, extractor, store) = setup(&[], dir.path());
    let transport = FakeTransport::default();

    flow.begin_search(1, &transport).await?;
    let outcome = flow.handle_query(1, "zzzz", &transport).await?;
    assert_eq!(outcome, FlowOutcome::NothingFound);
    assert_eq!(transport.last_text().as_deref(), Some(MSG_NOTHING_FOUND));
    assert_eq!(store.get(1).await.phase, Phase::Idle);

    let stray = SelectionToken::Download {
        index: 0,
        page: 0,
        generation: 1,
    }
    .encode();
    let outcome = flow.handle_callback(1, &stray, &transport).await?;
    assert_eq!(outcome, FlowOutcome::Rejected(RejectReason::NoActiveSearch));
    assert_eq!(transport.last_text().as_deref(), Some(MSG_INVALID_SELECTION));
    assert_eq!(extractor.downloads.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn test_download_delivers_once_and_removes_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (flow, extractor, store) = setup(&SEVEN, dir.path());
    let transport = FakeTransport::default();

    flow.begin_search(5, &transport).await?;
    flow.handle_query(5, "some song", &transport).await?;
    let page = transport.last_page();

    let outcome = flow
        .handle_callback(5, &button_data(&page, "C 3:20"), &transport)
        .await?;
    assert_eq!(outcome, FlowOutcome::Delivered);
    assert_eq!(extractor.downloads.load(Ordering::SeqCst), 1);

    let audio = transport.audio.lock().expect("lock").clone();
    assert_eq!(audio.len(), 1);
    let (path, caption, existed) = &audio[0];
    assert_eq!(caption, "C");
    assert!(existed, "file must exist while uploading");
    assert!(!path.exists(), "file must be removed after delivery");

    assert!(transport
        .texts
        .lock()
        .expect("lock")
        .contains(&"⏳ Downloading: C".to_string()));
    assert_eq!(store.get(5).await.phase, Phase::ResultsShown);
    Ok(())
}

#[tokio::test]
async fn test_failed_delivery_removes_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (flow, _, store) = setup(&SEVEN, dir.path());
    let transport = FakeTransport {
        fail_audio: true,
        ..FakeTransport::default()
    };

    flow.begin_search(5, &transport).await?;
    flow.handle_query(5, "some song", &transport).await?;
    let page = transport.last_page();

    let outcome = flow
        .handle_callback(5, &button_data(&page, "A 3:20"), &transport)
        .await?;
    assert_eq!(outcome, FlowOutcome::DownloadFailed);

    let audio = transport.audio.lock().expect("lock").clone();
    assert_eq!(audio.len(), 1);
    assert!(!audio[0].0.exists());
    assert_eq!(store.get(5).await.phase, Phase::ResultsShown);
    Ok(())
}

#[tokio::test]
async fn test_new_search_invalidates_old_buttons() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let (flow, extractor, _) = setup(&SEVEN, dir.path());
    let transport = FakeTransport::default();

    flow.begin_search(9, &transport).await?;
    flow.handle_query(9, "first song", &transport).await?;
    let old = transport.last_page();

    flow.begin_search(9, &transport).await?;
    flow.handle_query(9, "second song", &transport).await?;

    let outcome = flow
        .handle_callback(9, &button_data(&old, "A 3:20"), &transport)
        .await?;
    assert_eq!(outcome, FlowOutcome::Rejected(RejectReason::Stale));
    assert_eq!(extractor.downloads.load(Ordering::SeqCst), 0);
    Ok(())
}

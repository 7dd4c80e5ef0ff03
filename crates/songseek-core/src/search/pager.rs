//! Pure page rendering for result sets.
//!
//! Produces transport-neutral text and button rows; the transport turns
//! them into an inline keyboard.

use super::token::SelectionToken;
use super::{QueryKind, ResultSet, TrackInfo};
use crate::config::{BUTTON_TITLE_MAX_CHARS, PAGE_SIZE};
use crate::utils::truncate_with_ellipsis;

/// Label of the "previous page" button
pub const PREV_LABEL: &str = "⬅";
/// Label of the "next page" button
pub const NEXT_LABEL: &str = "➡";

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Visible label
    pub label: String,
    /// Token sent back when pressed
    pub token: SelectionToken,
}

/// A rendered page: header text plus button rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Header text
    pub text: String,
    /// Button rows, one track per row, navigation last
    pub rows: Vec<Vec<Button>>,
}

impl PageView {
    /// All buttons in display order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// Whether a "previous page" button is present.
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.buttons()
            .any(|b| matches!(b.token, SelectionToken::Prev { .. }))
    }

    /// Whether a "next page" button is present.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.buttons()
            .any(|b| matches!(b.token, SelectionToken::Next { .. }))
    }
}

/// Number of pages for `len` items.
#[must_use]
pub const fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// Format a duration as `" m:ss"`; empty for unknown or zero durations.
///
/// # Examples
///
/// ```
/// use songseek_core::search::pager::format_duration;
/// assert_eq!(format_duration(Some(225)), " 3:45");
/// assert_eq!(format_duration(None), "");
/// ```
#[must_use]
pub fn format_duration(duration: Option<u64>) -> String {
    match duration {
        Some(secs) if secs > 0 => format!(" {}:{:02}", secs / 60, secs % 60),
        _ => String::new(),
    }
}

/// Button label for a track: truncated title plus duration.
#[must_use]
pub fn button_label(track: &TrackInfo) -> String {
    format!(
        "{}{}",
        truncate_with_ellipsis(&track.title, BUTTON_TITLE_MAX_CHARS),
        format_duration(track.duration)
    )
}

/// Render one page of `results`.
///
/// Pure: identical inputs yield identical output. A page past the end
/// renders a header and navigation only.
#[must_use]
pub fn render_page(results: &ResultSet, page: usize, kind: QueryKind) -> PageView {
    let start = page.saturating_mul(PAGE_SIZE);
    let end = start.saturating_add(PAGE_SIZE);
    let generation = results.generation();
    let page_u32 = to_u32(page);

    let mut rows: Vec<Vec<Button>> = results
        .items()
        .iter()
        .enumerate()
        .skip(start)
        .take(PAGE_SIZE)
        .map(|(index, track)| {
            vec![Button {
                label: button_label(track),
                token: SelectionToken::Download {
                    index: to_u32(index),
                    page: page_u32,
                    generation,
                },
            }]
        })
        .collect();

    let mut nav = Vec::with_capacity(2);
    if page > 0 {
        nav.push(Button {
            label: PREV_LABEL.to_string(),
            token: SelectionToken::Prev {
                page: page_u32 - 1,
                generation,
            },
        });
    }
    if end < results.len() {
        nav.push(Button {
            label: NEXT_LABEL.to_string(),
            token: SelectionToken::Next {
                page: page_u32.saturating_add(1),
                generation,
            },
        });
    }
    if !nav.is_empty() {
        rows.push(nav);
    }

    let title = match kind {
        QueryKind::Artist => "Artist tracks",
        QueryKind::Track => "Search results",
    };
    let text = format!(
        "{title} (page {} of {}):",
        page + 1,
        page_count(results.len()).max(1)
    );

    PageView { text, rows }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

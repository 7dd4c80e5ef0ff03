//! View layer for bot UI components
//!
//! Contains keyboards and fixed message texts for the Telegram UI.

use songseek_core::search::PageView;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Greeting sent on `/start`
pub const WELCOME_TEXT: &str = "Hi! I'm a music search bot 🎶\n\
                                Use /search to find songs or artists.";

/// Hint for text sent outside a search
pub const SEARCH_HINT_TEXT: &str = "Use /search to find a song or an artist.";

/// Build the inline keyboard for a result page.
///
/// One row per track button; the navigation row (if any) stays last.
#[must_use]
pub fn page_keyboard(view: &PageView) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(view.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.token.encode()))
            .collect::<Vec<_>>()
    }))
}

/// File name shown for a delivered track: the title with path separators
/// replaced, plus the file's extension.
#[must_use]
pub fn audio_file_name(title: &str, extension: Option<&str>) -> String {
    let stem: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let stem = if stem.trim().is_empty() {
        "audio".to_string()
    } else {
        stem.trim().to_string()
    };
    format!("{stem}.{}", extension.unwrap_or("mp3"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use songseek_core::search::{render_page, QueryKind, ResultSet, TrackInfo};
    use teloxide::types::InlineKeyboardButtonKind;

    fn results(n: usize) -> ResultSet {
        ResultSet::from_raw(
            (0..n)
                .map(|i| TrackInfo {
                    id: format!("id{i}"),
                    title: format!("Song {i}"),
                    duration: Some(61),
                })
                .collect(),
        )
        .with_generation(3)
    }

    fn callback_data(button: &InlineKeyboardButton) -> Option<&str> {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => Some(data.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_keyboard_mirrors_page_rows() {
        let view = render_page(&results(7), 0, QueryKind::Track);
        let keyboard = page_keyboard(&view);

        assert_eq!(keyboard.inline_keyboard.len(), 6);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "Song 0 1:01");
        assert_eq!(callback_data(&keyboard.inline_keyboard[0][0]), Some("s:d:0:0:3"));
        assert_eq!(keyboard.inline_keyboard[5][0].text, "➡");
        assert_eq!(callback_data(&keyboard.inline_keyboard[5][0]), Some("s:n:1:3"));
    }

    #[test]
    fn test_keyboard_callback_data_fits_limit() {
        let view = render_page(&results(20), 3, QueryKind::Artist);
        let keyboard = page_keyboard(&view);
        for button in keyboard.inline_keyboard.iter().flatten() {
            let data = callback_data(button).unwrap_or_default();
            assert!(!data.is_empty());
            assert!(data.len() <= 64);
        }
    }

    #[test]
    fn test_audio_file_name() {
        assert_eq!(audio_file_name("AC/DC - T.N.T.", Some("mp3")), "AC_DC - T.N.T..mp3");
        assert_eq!(audio_file_name("  ", None), "audio.mp3");
        assert_eq!(audio_file_name("Song", Some("m4a")), "Song.m4a");
    }
}

//! Text chunking module
//!
//! Splits page text into fixed-size overlapping character windows for
//! embedding. Offsets and sizes are measured in characters, not bytes, so
//! multi-byte text never splits mid-character.

use tracing::debug;
use veridex_common::config::ChunkingConfig;

/// A chunk of page text plus where it started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    /// Window content, trimmed of surrounding whitespace
    pub text: String,

    /// Character offset of the window start within the page text
    pub start_offset: usize,
}

/// Split text into overlapping windows.
///
/// Consecutive windows start `chunk_size - chunk_overlap` characters apart.
/// The pass ends with the first window that reaches the end of the text, so
/// text of length `L > W` yields `ceil((L - O) / (W - O))` windows and text
/// of length `0 < L <= W` yields exactly one. Windows that trim to nothing
/// are dropped.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextWindow> {
    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();
    let mut windows = Vec::new();

    if total_len == 0 {
        return windows;
    }

    let stride = if config.chunk_overlap < config.chunk_size {
        config.chunk_size - config.chunk_overlap
    } else {
        config.chunk_size / 2
    }
    .max(1);

    let mut start = 0;
    loop {
        let end = (start + config.chunk_size).min(total_len);
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();

        if !trimmed.is_empty() {
            windows.push(TextWindow {
                text: trimmed.to_string(),
                start_offset: start,
            });
        }

        if end >= total_len {
            break;
        }
        start += stride;
    }

    debug!(
        input_len = total_len,
        window_count = windows.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        "Text chunked"
    );

    windows
}

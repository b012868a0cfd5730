//! Text chunking with configurable size and overlap.

/// A chunk of the source text along with the byte span it was cut from.
#[derive(Debug, Clone)]
pub struct ChunkPiece {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Chunk text into overlapping segments of at most `chunk_size` bytes.
///
/// Cut points prefer paragraph breaks, then sentence ends, then plain
/// whitespace, falling back to a hard cut at a character boundary. A
/// preferred cut is only taken in the back half of the window so chunks
/// never collapse below half the configured size. Consecutive chunks
/// overlap by roughly `overlap` bytes.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<ChunkPiece> {
    if text.trim().is_empty() || chunk_size == 0 {
        return vec![];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = char_floor(text, (start + chunk_size).min(text.len()));

        if end < text.len() {
            // Only cut early in the back half of the window.
            let earliest = start + chunk_size / 2;
            if let Some(cut) = find_cut(&text[start..end], earliest - start) {
                end = start + cut;
            }
        }

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            chunks.push(ChunkPiece {
                text: piece.to_string(),
                start,
                end,
            });
        }

        if end >= text.len() {
            break;
        }

        // Step back by the overlap, clamped so we always advance.
        let mut next_start = end.saturating_sub(overlap).max(start + 1);
        next_start = char_ceil(text, next_start);
        if next_start <= start {
            break;
        }
        start = next_start;
    }

    tracing::debug!(
        chunks = chunks.len(),
        chunk_size,
        overlap,
        "chunked text"
    );

    chunks
}

/// Largest char boundary at or below `index`.
fn char_floor(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`.
fn char_ceil(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Looks for the best cut point in `window`, at or after `earliest`.
/// Returns the byte offset just past the boundary, or `None` when the
/// window has no usable break.
fn find_cut(window: &str, earliest: usize) -> Option<usize> {
    if let Some(pos) = window.rfind("\n\n") {
        if pos >= earliest {
            return Some(pos + 2);
        }
    }

    let sentence_end = [". ", ".\n", "! ", "? "]
        .iter()
        .filter_map(|pat| window.rfind(pat).map(|pos| pos + pat.len()))
        .max();
    if let Some(pos) = sentence_end {
        if pos >= earliest {
            return Some(pos);
        }
    }

    let whitespace = window
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(pos, c)| pos + c.len_utf8());
    match whitespace {
        Some(pos) if pos >= earliest => Some(pos),
        _ => None,
    }
}

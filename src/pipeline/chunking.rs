//! Sentence-bounded chunking.
//!
//! Text is split on the fixed delimiter `". "` into sentence units, and units are greedily
//! packed into segments whose character length stays below `max_length`:
//!
//! - Every unit is re-terminated with `". "` when appended, so segments end on sentence
//!   boundaries. The final unit loses one trailing `.` first so it is not doubled.
//! - A unit is measured together with its terminator. When the buffer is non-empty and adding
//!   the unit would reach or exceed `max_length`, the buffer is closed and the unit starts a
//!   new one.
//! - A single unit at or over the bound becomes its own oversized segment. The bound is a soft
//!   target; sentences are never cut mid-word.
//!
//! `chunk("A. B. C.", 5)` therefore yields `["A. ", "B. ", "C. "]`.

use super::types::{ChunkingError, Segment};

const DELIMITER: &str = ". ";

/// Split `text` into ordered, sentence-bounded segments.
///
/// Returns an empty vector for blank text; callers are expected to reject blank documents
/// before chunking.
pub fn chunk(text: &str, max_length: usize) -> Result<Vec<Segment>, ChunkingError> {
    if max_length == 0 {
        return Err(ChunkingError::InvalidMaxLength);
    }

    let delimiter_len = DELIMITER.chars().count();
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0;

    for unit in sentence_units(text) {
        let unit_len = unit.chars().count() + delimiter_len;
        if buffer_len > 0 && buffer_len + unit_len >= max_length {
            segments.push(Segment::new(segments.len(), std::mem::take(&mut buffer)));
            buffer_len = 0;
        }
        buffer.push_str(unit);
        buffer.push_str(DELIMITER);
        buffer_len += unit_len;
    }

    if !buffer.is_empty() {
        segments.push(Segment::new(segments.len(), buffer));
    }

    Ok(segments)
}

/// Break text into trimmed, non-empty sentence units.
fn sentence_units(text: &str) -> Vec<&str> {
    let mut units: Vec<&str> = text
        .split(DELIMITER)
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .collect();

    if let Some(last) = units.last_mut() {
        if let Some(stripped) = last.strip_suffix('.') {
            *last = stripped.trim_end();
        }
        if last.is_empty() {
            units.pop();
        }
    }

    units
}

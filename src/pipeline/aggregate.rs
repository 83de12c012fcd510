//! Joining per-segment summaries.
//!
//! Summaries are concatenated in segment order with a blank line between entries. No
//! semantic merging happens here: each segment is summarized on its own, so repeated headings
//! across segments are left as the backend produced them.

const SEPARATOR: &str = "\n\n";

/// Join texts in the given order with a blank-line separator.
pub fn join<S: AsRef<str>>(texts: &[S]) -> String {
    let mut joined = String::new();
    for (position, text) in texts.iter().enumerate() {
        if position > 0 {
            joined.push_str(SEPARATOR);
        }
        joined.push_str(text.as_ref());
    }
    joined
}

/// Prefix a summary with a heading naming its source document.
pub fn titled(name: &str, body: &str) -> String {
    format!("Summary of {name}:{SEPARATOR}{body}")
}

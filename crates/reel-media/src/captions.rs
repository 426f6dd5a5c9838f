//! Caption segmentation and timing.
//!
//! Splits narration into display segments and assigns each a time window
//! proportional to its word count, so pacing follows the spoken text.
//! Segments are derived per assembly and never persisted.

/// Default maximum characters per caption segment.
pub const DEFAULT_MAX_CAPTION_CHARS: usize = 45;

/// A timed sub-span of a scene's narration.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSegment {
    /// Sanitized display text.
    pub text: String,
    /// Display start, seconds from scene start.
    pub start: f64,
    /// Display end, seconds from scene start.
    pub end: f64,
}

/// Segment narration into timed captions over `scene_duration` seconds.
///
/// 1. Split on sentence-ending punctuation followed by whitespace.
/// 2. Keep sentences within `max_chars` whole; greedily word-pack longer
///    ones. Narration without any sentence boundary is packed the same way.
/// 3. Each segment's duration share is `scene_duration * words / total_words`,
///    with starts as the cumulative sum of prior durations.
///
/// Empty narration yields an empty list (no captions rendered).
pub fn segment_narration(
    narration: &str,
    scene_duration: f64,
    max_chars: usize,
) -> Vec<CaptionSegment> {
    let narration = narration.trim();
    if narration.is_empty() || scene_duration <= 0.0 {
        return Vec::new();
    }

    let mut chunks: Vec<String> = Vec::new();
    for sentence in split_sentences(narration) {
        if sentence.chars().count() <= max_chars {
            chunks.push(sentence);
        } else {
            chunks.extend(pack_words(&sentence, max_chars));
        }
    }

    let word_counts: Vec<usize> = chunks.iter().map(|c| count_words(c)).collect();
    let total_words: usize = word_counts.iter().sum();
    // Chunks come from whitespace-delimited packing, so a zero total should
    // be impossible; bail out rather than divide by zero.
    if total_words == 0 {
        return Vec::new();
    }

    let mut segments = Vec::with_capacity(chunks.len());
    let mut start = 0.0f64;
    let last = chunks.len() - 1;
    for (i, (chunk, words)) in chunks.into_iter().zip(word_counts).enumerate() {
        let duration = scene_duration * (words as f64 / total_words as f64);
        // Pin the final boundary so the segments cover [0, duration) exactly
        // instead of accumulating float drift.
        let end = if i == last {
            scene_duration
        } else {
            start + duration
        };
        segments.push(CaptionSegment {
            text: sanitize_for_overlay(&chunk),
            start,
            end,
        });
        start = end;
    }

    segments
}

/// Split text on sentence-ending punctuation followed by whitespace,
/// keeping the punctuation with its sentence.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            if let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    let trimmed = current.trim();
                    if !trimmed.is_empty() {
                        sentences.push(trimmed.to_string());
                    }
                    current.clear();
                }
            }
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }

    sentences
}

/// Greedily pack whitespace-delimited words into chunks of at most
/// `max_chars` characters. A single over-long word becomes its own chunk.
fn pack_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Sanitize caption text for the ffmpeg drawtext DSL.
///
/// Control characters are stripped, quote characters removed (the text is
/// embedded in a single-quoted value), and reserved filter-graph
/// delimiters escaped.
pub fn sanitize_for_overlay(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            c if c.is_control() => {}
            '\'' | '"' | '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' => {}
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '[' => out.push_str("\\["),
            ']' => out.push_str("\\]"),
            c => out.push(c),
        }
    }
    out
}

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed turn events and the sentence segmenter.
//!
//! The turn task and the SSE emitter are decoupled by one producer-consumer
//! channel of these events. The emitter translates them to SSE frames and
//! closes on `Done` or `Error`.

use std::time::Duration;

use minerva_core::ToolCallRecord;

/// Pause between emitted segments to smooth client rendering.
pub const SEGMENT_PACING: Duration = Duration::from_millis(30);

/// Events flowing from the turn task to the stream emitter.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// One sentence-sized slice of the assistant text.
    Segment(String),
    /// The turn's tool-call records, emitted once before `Done`.
    History(Vec<ToolCallRecord>),
    /// Terminal success, carrying the conversation id.
    Done(String),
    /// Terminal failure, carrying a client-safe message.
    Error(String),
}

/// Sentence terminators; each stays with the segment it ends.
const TERMINATORS: [char; 7] = ['.', '!', '?', '。', '！', '？', '\n'];

/// Splits text after every sentence terminator.
///
/// Every character of the input belongs to exactly one segment, so
/// concatenating the segments reproduces the input byte for byte.
/// Whitespace-only segments are kept here; emitters skip them.
pub fn segment(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if TERMINATORS.contains(&c) {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

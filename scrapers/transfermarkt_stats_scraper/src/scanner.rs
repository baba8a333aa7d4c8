//! Event window scanner.
//!
//! Every minute notation in a match report becomes a [`MinuteEvent`] carrying
//! the raw text around it. The notation usually precedes the text that names
//! the event type, club and player, at varying distance, so the window is wide.

use std::ops::Range;

use crate::{
    minute::{tokenize, MinuteNotation, MinuteTokens},
    types::MatchDocument,
};

/// Characters of context kept on each side of a notation.
pub const WINDOW_RADIUS: usize = 900;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteEvent<'a> {
    pub minute: u32,
    pub notation: MinuteNotation,
    /// Position of the notation in the document.
    pub span: Range<usize>,
    /// Document offset where `window` starts.
    pub window_start: usize,
    pub window: &'a str,
}

impl<'a> MinuteEvent<'a> {
    /// Position of the notation relative to `window`.
    pub fn anchor(&self) -> Range<usize> {
        self.span.start - self.window_start..self.span.end - self.window_start
    }
}

/// Byte offset `radius` characters before `index`, or 0.
fn window_floor(text: &str, index: usize, radius: usize) -> usize {
    if radius == 0 {
        return index;
    }
    text[..index]
        .char_indices()
        .rev()
        .nth(radius - 1)
        .map_or(0, |(i, _)| i)
}

/// Byte offset `radius` characters after `index`, or the end of `text`.
fn window_ceil(text: &str, index: usize, radius: usize) -> usize {
    text[index..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(i, _)| index + i)
}

/// Lazily scans a match report. Each call re-derives the events.
pub fn scan(document: &MatchDocument) -> MinuteEvents<'_> {
    scan_text(document.as_str())
}

pub fn scan_text(text: &str) -> MinuteEvents<'_> {
    MinuteEvents {
        text,
        tokens: tokenize(text),
    }
}

pub struct MinuteEvents<'a> {
    text: &'a str,
    tokens: MinuteTokens<'a>,
}

impl<'a> Iterator for MinuteEvents<'a> {
    type Item = MinuteEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.tokens.next()?;
        let start = window_floor(self.text, token.span.start, WINDOW_RADIUS);
        let end = window_ceil(self.text, token.span.end, WINDOW_RADIUS);
        Some(MinuteEvent {
            minute: token.minute.total(),
            notation: token.notation,
            span: token.span,
            window_start: start,
            window: &self.text[start..end],
        })
    }
}

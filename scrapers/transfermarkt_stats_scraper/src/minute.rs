//! Minute notations found in match reports.
//!
//! Reports mix a compact clock form (`67'`, `45+2'`) with a verbose form
//! (`67. Min.`, `90+3. min.`). Both normalize to `base + extra`.

use std::{iter::Peekable, ops::Range};

use once_cell::sync::Lazy;
use regex::{CaptureMatches, Captures, Regex};

static CLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,3})(?:\s*\+\s*(\d{1,2}))?(?:'|&#0?39;)").unwrap());
static VERBOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,3})(?:\+(\d{1,2}))?\.\s*min\.").unwrap());
static MINUTES_PLAYED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{1,3})'\s*$").unwrap());
static ANY_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinuteNotation {
    /// `67'` or `45+2'`
    Clock,
    /// `67. Min.` or `45+2. min.`
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Minute {
    pub base: u32,
    pub extra: u32,
}

impl Minute {
    pub fn total(&self) -> u32 {
        self.base + self.extra
    }
}

/// A notation occurrence inside a larger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteToken {
    pub notation: MinuteNotation,
    pub minute: Minute,
    pub span: Range<usize>,
}

fn minute_from(caps: &Captures<'_>) -> Option<Minute> {
    let base = caps.get(1)?.as_str().parse().ok()?;
    let extra = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some(Minute { base, extra })
}

fn token_from(notation: MinuteNotation, caps: &Captures<'_>) -> Option<MinuteToken> {
    let whole = caps.get(0)?;
    Some(MinuteToken {
        notation,
        minute: minute_from(caps)?,
        span: whole.range(),
    })
}

/// Parses the first minute notation in `text`, whichever form comes first.
pub fn parse_minute(text: &str) -> Option<Minute> {
    tokenize(text).next().map(|token| token.minute)
}

/// Iterates every notation of both forms in document order.
pub fn tokenize(text: &str) -> MinuteTokens<'_> {
    MinuteTokens {
        text,
        clock: CLOCK.captures_iter(text).peekable(),
        verbose: VERBOSE.captures_iter(text).peekable(),
    }
}

/// Merges the clock and verbose matches by start offset. On equal offsets the
/// clock form is yielded first.
pub struct MinuteTokens<'h> {
    text: &'h str,
    clock: Peekable<CaptureMatches<'static, 'h>>,
    verbose: Peekable<CaptureMatches<'static, 'h>>,
}

impl<'h> Iterator for MinuteTokens<'h> {
    type Item = MinuteToken;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let clock_start = self.clock.peek().and_then(|c| c.get(0)).map(|m| m.start());
            let verbose_start = self.verbose.peek().and_then(|c| c.get(0)).map(|m| m.start());

            let (notation, caps) = match (clock_start, verbose_start) {
                (None, None) => return None,
                (Some(c), Some(v)) if v < c => (MinuteNotation::Verbose, self.verbose.next()?),
                (Some(_), _) => (MinuteNotation::Clock, self.clock.next()?),
                (None, Some(_)) => (MinuteNotation::Verbose, self.verbose.next()?),
            };

            let Some(token) = token_from(notation, &caps) else {
                continue;
            };
            if notation == MinuteNotation::Clock && inside_markup_value(self.text, token.span.start) {
                continue;
            }
            return Some(token);
        }
    }
}

/// A quoted attribute value or path segment (`width='100'`, `/verein/12'`)
/// looks like a clock minute but is not one.
fn inside_markup_value(text: &str, start: usize) -> bool {
    matches!(
        text[..start].chars().next_back(),
        Some('\'' | '"' | '=' | '/' | '#' | '-' | '_')
    )
}

/// Minutes-played cell: the whole text is a single clock minute like `78'`.
pub fn parse_minutes_played(cell_text: &str) -> Option<u32> {
    MINUTES_PLAYED
        .captures(cell_text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Counts a statistic cell. Goal and card cells list one clock minute per
/// occurrence; otherwise the cell holds a plain number or nothing.
pub fn cell_count(cell_text: &str) -> u32 {
    if cell_text.trim().is_empty() {
        return 0;
    }
    let minutes = CLOCK.find_iter(cell_text).count();
    if minutes > 0 {
        return minutes as u32;
    }
    ANY_INT
        .find(cell_text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

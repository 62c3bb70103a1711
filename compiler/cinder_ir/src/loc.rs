//! Source locations and line notes.
//!
//! A [`SourceLoc`] pins a token (or a diagnostic) to an interned source
//! name plus 1-based line and column. The [`LineNote`] inside it is a
//! shared view of the stream's text anchored at the current physical
//! line's first byte, so caret diagnostics can reprint the offending line
//! long after the reader has moved on.
//!
//! Two distinct update operations exist on purpose: [`SourceLoc::mark`]
//! resets everything at a token boundary, while [`SourceLoc::remark`]
//! moves line/column/note but keeps the source name — escape sequences
//! that span a splice get re-pinned to their actual origin without
//! forgetting which file they came from.

use crate::SourceName;
use cinder_charbuf::CharBuf;

use std::fmt;
use std::rc::Rc;

/// A pointer into a stream's text at the first byte of a physical line.
///
/// Cloning shares the underlying text; notes stay valid for as long as any
/// token or diagnostic holds one.
#[derive(Clone, Debug)]
pub struct LineNote {
    text: Rc<[u8]>,
    start: u32,
}

impl LineNote {
    /// Create a note anchored at byte `start` of `text`.
    pub fn new(text: Rc<[u8]>, start: u32) -> Self {
        debug_assert!(
            (start as usize) <= text.len(),
            "line start {start} past end of text"
        );
        LineNote { text, start }
    }

    /// The physical line's bytes, up to but not including the line
    /// terminator (or end of text).
    pub fn line(&self) -> &[u8] {
        let tail = &self.text[self.start as usize..];
        match memchr::memchr2(b'\r', b'\n', tail) {
            Some(end) => &tail[..end],
            None => tail,
        }
    }

    /// The physical line captured into an owned buffer.
    pub fn to_charbuf(&self) -> CharBuf {
        CharBuf::from_bytes(self.line())
    }
}

impl PartialEq for LineNote {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.text, &other.text) && self.start == other.start
    }
}

impl Eq for LineNote {}

/// Where a token began: interned name, 1-based line and column, and the
/// note for caret rendering.
///
/// A cleared location (the scratch-token resting state) has no name, no
/// note, and zeroed line/column.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct SourceLoc {
    pub name: Option<SourceName>,
    pub line: u32,
    pub column: u32,
    pub note: Option<LineNote>,
}

impl SourceLoc {
    /// The cleared state.
    pub fn cleared() -> Self {
        SourceLoc::default()
    }

    /// Set all four fields at once (token start).
    pub fn mark(&mut self, name: Option<SourceName>, line: u32, column: u32, note: Option<LineNote>) {
        self.name = name;
        self.line = line;
        self.column = column;
        self.note = note;
    }

    /// Move line/column/note, keeping the source name.
    pub fn remark(&mut self, line: u32, column: u32, note: Option<LineNote>) {
        self.line = line;
        self.column = column;
        self.note = note;
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}:{}:{}", self.line, self.column),
            None => write!(f, "<unknown>:{}:{}", self.line, self.column),
        }
    }
}

//! Logical source reader for the Cinder front end.
//!
//! A [`Reader`] is a LIFO stack of input streams — file-backed or
//! in-memory — presenting a single logical character cursor. The stream
//! on top of the stack is the active one; `#include` pushes, exhaustion
//! pops. Characters delivered by [`Reader::get`] have already been
//! through translation phases 1 and 2: line endings are canonical `\n`
//! and backslash-newline splices are gone, while line/column and
//! line-note tracking stay faithful for diagnostics.
//!
//! End of input is `None`, reported only for the active stream; the
//! caller (the preprocessor, ultimately) decides when to pop and resume
//! the stream below.

mod stream;

pub use stream::StreamKind;

use crate::stream::Stream;
use cinder_diagnostic::DiagnosticSink;
use cinder_ir::{FileTimes, LineNote, NamePool, Options, SourceName};

use smallvec::SmallVec;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// Failure to set up a stream.
///
/// `push_file` creates no stream when it fails; the reader's state is
/// exactly what it was before the call.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A snapshot of the active stream's position, for marking tokens.
#[derive(Clone, Debug)]
pub struct StreamPos {
    pub name: SourceName,
    pub line: u32,
    pub column: u32,
    pub note: LineNote,
}

/// Stack of input streams with one logical character cursor.
pub struct Reader {
    pool: NamePool,
    streams: SmallVec<[Stream; 4]>,
    options: Options,
    sink: Rc<DiagnosticSink>,
}

impl Reader {
    /// Create a reader with no streams.
    pub fn new(options: Options, sink: Rc<DiagnosticSink>) -> Self {
        Reader {
            pool: NamePool::new(),
            streams: SmallVec::new(),
            options,
            sink,
        }
    }

    /// Push a file-backed stream, loading the entire file eagerly.
    ///
    /// On failure no stream is created and the error is returned.
    pub fn push_file(&mut self, path: impl AsRef<Path>) -> Result<(), ReaderError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let times = std::fs::metadata(path)
            .ok()
            .map(|meta| FileTimes::from_metadata(&meta));
        let name = self.pool.intern(&path.to_string_lossy());
        debug!(path = %path.display(), bytes = bytes.len(), "pushed file stream");
        self.streams
            .push(Stream::new(StreamKind::File, name, Rc::from(bytes), times));
        Ok(())
    }

    /// Push an in-memory stream labeled `<string>`.
    pub fn push_str(&mut self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    /// Push an in-memory byte stream labeled `<string>`.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        let name = self.pool.intern("<string>");
        debug!(bytes = bytes.len(), "pushed string stream");
        self.streams
            .push(Stream::new(StreamKind::Text, name, Rc::from(bytes), None));
    }

    /// Discard the active stream. Must balance a prior push.
    pub fn pop(&mut self) {
        debug_assert!(!self.streams.is_empty(), "pop on empty reader");
        if self.streams.pop().is_some() {
            debug!(depth = self.streams.len(), "popped stream");
        }
    }

    /// Number of streams on the stack.
    pub fn depth(&self) -> usize {
        self.streams.len()
    }

    /// Returns `true` when no streams remain.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Consume and return one logical character; `None` at end of input
    /// (or when no stream is active).
    pub fn get(&mut self) -> Option<u8> {
        let options = self.options;
        let sink = Rc::clone(&self.sink);
        self.streams.last_mut()?.get(options, &sink)
    }

    /// The next logical character without consuming it.
    ///
    /// Idempotent: repeated peeks with no intervening `get` agree, and no
    /// warnings are emitted from the lookahead.
    pub fn peek(&self) -> Option<u8> {
        self.streams.last()?.peek()
    }

    /// Push `ch` back onto the active stream; unlimited depth.
    ///
    /// End of input cannot be put back, and a NUL byte never comes out of
    /// `get`, so neither is a valid argument.
    pub fn unget(&mut self, ch: u8) {
        debug_assert!(ch != 0, "unget of NUL byte");
        debug_assert!(!self.streams.is_empty(), "unget on empty reader");
        if let Some(stream) = self.streams.last_mut() {
            stream.unget(ch);
        }
    }

    /// Consume the next character if it equals `ch`.
    pub fn accept(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            let _ = self.get();
            true
        } else {
            false
        }
    }

    /// Returns `true` if the next character equals `ch`.
    pub fn at(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Current line of the active stream, 1-based.
    pub fn line(&self) -> Option<u32> {
        self.streams.last().map(Stream::line)
    }

    /// Current column of the active stream, 1-based.
    pub fn column(&self) -> Option<u32> {
        self.streams.last().map(Stream::column)
    }

    /// The active stream's source name.
    pub fn name(&self) -> Option<&SourceName> {
        self.streams.last().map(Stream::name)
    }

    /// Note anchored at the current physical line, for caret diagnostics.
    pub fn line_note(&self) -> Option<LineNote> {
        self.streams.last().map(Stream::line_note)
    }

    /// Everything a token mark needs, in one snapshot.
    pub fn position(&self) -> Option<StreamPos> {
        self.streams.last().map(|stream| StreamPos {
            name: stream.name().clone(),
            line: stream.line(),
            column: stream.column(),
            note: stream.line_note(),
        })
    }

    /// Timestamps of the active stream's file, when file-backed.
    pub fn file_times(&self) -> Option<FileTimes> {
        self.streams.last().and_then(Stream::times)
    }
}

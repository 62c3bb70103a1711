//! One entry in the reader's stream stack.
//!
//! A stream owns its text (shared with the line notes it hands out) and a
//! cursor over it, and applies the two source transformations on every
//! delivered character:
//!
//! 1. Line endings canonicalize to `\n` — `\r\n` and lone `\r` both
//!    deliver a single line feed.
//! 2. A backslash whose line ends right after it splices the physical
//!    lines: backslash and terminator are absorbed and delivery restarts
//!    on the next line. Horizontal whitespace between the backslash and
//!    the terminator still splices, with an optional warning.
//!
//! A stream that does not end in a newline synthesizes one, so every
//! translation unit the lexer sees is newline-terminated. End of input is
//! reported only after that final newline has been delivered.

use cinder_charbuf::CharBuf;
use cinder_diagnostic::{Caret, DiagnosticSink};
use cinder_ir::{FileTimes, LineNote, Options, SourceLoc, SourceName};

use std::rc::Rc;

/// Horizontal or vertical whitespace, as the splice scanner counts it.
fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | 0x0B | 0x0C | b'\r' | b'\n')
}

/// Where a stream's bytes came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StreamKind {
    /// Loaded eagerly from a file path.
    File,
    /// Supplied in memory, labeled `<string>`.
    Text,
}

/// What the stream delivered last; drives newline synthesis at the end.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Last {
    /// Nothing delivered yet.
    Start,
    Byte(u8),
    Eof,
}

/// Outcome of scanning past a backslash.
enum Splice {
    /// Backslash and newline absorbed; restart delivery at the new cursor.
    Restart,
    /// Backslash ran into end of input; deliver a synthesized newline.
    SyntheticNewline,
    /// No splice; deliver the backslash itself.
    Deliver,
}

pub(crate) struct Stream {
    #[allow(dead_code, reason = "recorded for preprocessor-level queries")]
    kind: StreamKind,
    name: SourceName,
    text: Rc<[u8]>,
    /// Read cursor, always within `[0, text.len()]`.
    pos: usize,
    /// 1-based; steps once per logical newline delivered or spliced.
    line: u32,
    /// 1-based; resets to 1 immediately after a line transition.
    column: u32,
    /// Byte offset of the current physical line's first byte.
    line_start: usize,
    /// Put-back characters, unbounded.
    stash: CharBuf,
    last: Last,
    times: Option<FileTimes>,
}

impl Stream {
    pub fn new(kind: StreamKind, name: SourceName, text: Rc<[u8]>, times: Option<FileTimes>) -> Self {
        Stream {
            kind,
            name,
            text,
            pos: 0,
            line: 1,
            column: 1,
            line_start: 0,
            stash: CharBuf::new(),
            last: Last::Start,
            times,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn name(&self) -> &SourceName {
        &self.name
    }

    pub fn times(&self) -> Option<FileTimes> {
        self.times
    }

    pub fn line_note(&self) -> LineNote {
        LineNote::new(Rc::clone(&self.text), self.line_start as u32)
    }

    /// The stream's own position as a diagnostic location.
    fn loc(&self) -> SourceLoc {
        let mut loc = SourceLoc::cleared();
        loc.mark(
            Some(self.name.clone()),
            self.line,
            self.column,
            Some(self.line_note()),
        );
        loc
    }

    fn step_line(&mut self) {
        self.line += 1;
        self.column = 1;
        self.line_start = self.pos;
    }

    /// Push a character back; the next `get`/`peek` sees it first.
    pub fn unget(&mut self, ch: u8) {
        self.stash.push(ch);
    }

    /// Deliver the next logical character, or `None` at end of input.
    pub fn get(&mut self, options: Options, sink: &DiagnosticSink) -> Option<u8> {
        if let Some(ch) = self.stash.pop() {
            self.last = Last::Byte(ch);
            return Some(ch);
        }

        let ch = loop {
            if self.pos >= self.text.len() {
                if matches!(self.last, Last::Byte(b'\n') | Last::Eof) {
                    self.last = Last::Eof;
                    return None;
                }
                // Input did not end in a newline; make one up.
                break b'\n';
            }

            let ch = self.text[self.pos];
            self.pos += 1;

            if ch == b'\r' {
                if self.pos < self.text.len() && self.text[self.pos] == b'\n' {
                    self.pos += 1;
                }
                self.step_line();
                break b'\n';
            } else if ch == b'\n' {
                self.step_line();
                break b'\n';
            } else if ch == b'\\' {
                match self.scan_splice(options, sink) {
                    Splice::Restart => continue,
                    Splice::SyntheticNewline => break b'\n',
                    Splice::Deliver => break b'\\',
                }
            } else {
                self.column += 1;
                break ch;
            }
        };

        self.last = Last::Byte(ch);
        Some(ch)
    }

    /// The cursor sits just past a backslash: look for a line terminator
    /// behind optional horizontal whitespace and splice if one is there.
    fn scan_splice(&mut self, options: Options, sink: &DiagnosticSink) -> Splice {
        let text = Rc::clone(&self.text);
        let len = text.len();
        let start = self.pos;
        let mut pc = start;
        let mut step = 0usize;

        while pc < len && is_space(text[pc]) {
            let terminator = match text[pc] {
                b'\r' => {
                    if pc + 1 < len && text[pc + 1] == b'\n' {
                        pc += 1;
                        step += 1;
                    }
                    true
                }
                b'\n' => true,
                _ => {
                    pc += 1;
                    false
                }
            };
            if terminator {
                if pc > start + step && options.contains(Options::WARN_BACKSLASH_NEWLINE_SPACE) {
                    sink.warning_at(
                        &self.loc(),
                        Caret::at(self.column),
                        "backslash and newline separated by space",
                    );
                }
                self.pos = pc + 1;
                self.step_line();
                return Splice::Restart;
            }
        }

        if pc == len {
            if options.contains(Options::WARN_NO_NEWLINE_EOF) {
                sink.warning_at(
                    &self.loc(),
                    Caret::at(self.column),
                    "backslash-newline at end of file",
                );
            }
            self.pos = pc;
            return Splice::SyntheticNewline;
        }

        Splice::Deliver
    }

    /// The same computation as [`get`](Self::get) on a scratch cursor:
    /// no mutation, no warnings, same delivered character.
    pub fn peek(&self) -> Option<u8> {
        if let Some(&top) = self.stash.as_bytes().last() {
            return Some(top);
        }

        let text = &self.text;
        let len = text.len();
        let mut pc = self.pos;

        'nextch: loop {
            if pc >= len {
                return if matches!(self.last, Last::Byte(b'\n') | Last::Eof) {
                    None
                } else {
                    Some(b'\n')
                };
            }

            let ch = text[pc];
            pc += 1;

            match ch {
                b'\r' | b'\n' => return Some(b'\n'),
                b'\\' => {
                    while pc < len && is_space(text[pc]) {
                        match text[pc] {
                            b'\r' => {
                                if pc + 1 < len && text[pc + 1] == b'\n' {
                                    pc += 1;
                                }
                                pc += 1;
                                continue 'nextch;
                            }
                            b'\n' => {
                                pc += 1;
                                continue 'nextch;
                            }
                            _ => pc += 1,
                        }
                    }
                    if pc == len {
                        return Some(b'\n');
                    }
                    return Some(b'\\');
                }
                _ => return Some(ch),
            }
        }
    }
}

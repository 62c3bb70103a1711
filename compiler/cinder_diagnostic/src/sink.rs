//! The sink the reader and lexer report through.
//!
//! The sink is shared (wrapped in `Rc`) between the reader and the lexer
//! of one translation unit, so it uses interior mutability: `Cell`
//! counters and a `RefCell`-boxed emitter. Single-threaded by contract —
//! one translation unit is processed by one worker at a time.

use crate::{Caret, Diagnostic, Severity};
use cinder_ir::{SourceLoc, Token};

use std::cell::{Cell, Ref, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

/// Formats and delivers diagnostics.
pub trait Emit {
    fn emit(&mut self, diag: &Diagnostic);
}

/// Human-readable output: position header, the physical source line, and a
/// caret underneath.
pub struct TerminalEmitter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalEmitter<W> {
    /// Create an emitter writing to `writer`.
    pub fn new(writer: W) -> Self {
        TerminalEmitter { writer }
    }

    /// Create an emitter for stderr.
    pub fn stderr() -> TerminalEmitter<io::Stderr> {
        TerminalEmitter {
            writer: io::stderr(),
        }
    }
}

impl<W: Write> Emit for TerminalEmitter<W> {
    fn emit(&mut self, diag: &Diagnostic) {
        let _ = writeln!(self.writer, "{diag}");
        if let Some(note) = &diag.loc.note {
            let line = String::from_utf8_lossy(note.line()).into_owned();
            let _ = writeln!(self.writer, " {line}");
            let pad = " ".repeat(diag.caret.column.max(1) as usize);
            let tilde = "~".repeat(diag.caret.width.saturating_sub(1) as usize);
            let _ = writeln!(self.writer, "{pad}^{tilde}");
        }
    }
}

/// Collects diagnostics for inspection; clones share one store.
#[derive(Clone, Default)]
pub struct MemoryEmitter {
    store: Rc<RefCell<Vec<Diagnostic>>>,
}

impl MemoryEmitter {
    /// Create an empty collecting emitter.
    pub fn new() -> Self {
        MemoryEmitter::default()
    }

    /// All diagnostics collected so far.
    pub fn diagnostics(&self) -> Ref<'_, Vec<Diagnostic>> {
        self.store.borrow()
    }

    /// The collected messages, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.store
            .borrow()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }
}

impl Emit for MemoryEmitter {
    fn emit(&mut self, diag: &Diagnostic) {
        self.store.borrow_mut().push(diag.clone());
    }
}

/// The sink: eager emission plus error/warning counters.
pub struct DiagnosticSink {
    errors: Cell<u32>,
    warnings: Cell<u32>,
    emitter: RefCell<Box<dyn Emit>>,
}

impl DiagnosticSink {
    /// Create a sink delivering through `emitter`.
    pub fn new(emitter: Box<dyn Emit>) -> Self {
        DiagnosticSink {
            errors: Cell::new(0),
            warnings: Cell::new(0),
            emitter: RefCell::new(emitter),
        }
    }

    /// Create a sink rendering to stderr.
    pub fn stderr() -> Self {
        DiagnosticSink::new(Box::new(TerminalEmitter::<io::Stderr>::stderr()))
    }

    /// Report an error at a token's location, marking its literal width.
    pub fn error_at_token(&self, tok: &Token, message: impl Into<String>) {
        self.report(Severity::Error, &tok.loc, token_caret(tok), message.into());
    }

    /// Report a warning at a token's location.
    pub fn warning_at_token(&self, tok: &Token, message: impl Into<String>) {
        self.report(Severity::Warning, &tok.loc, token_caret(tok), message.into());
    }

    /// Report an error at an explicit reader position.
    pub fn error_at(&self, loc: &SourceLoc, caret: Caret, message: impl Into<String>) {
        self.report(Severity::Error, loc, caret, message.into());
    }

    /// Report a warning at an explicit reader position.
    pub fn warning_at(&self, loc: &SourceLoc, caret: Caret, message: impl Into<String>) {
        self.report(Severity::Warning, loc, caret, message.into());
    }

    fn report(&self, severity: Severity, loc: &SourceLoc, caret: Caret, message: String) {
        match severity {
            Severity::Error => self.errors.set(self.errors.get() + 1),
            Severity::Warning => self.warnings.set(self.warnings.get() + 1),
        }
        let diag = Diagnostic {
            severity,
            loc: loc.clone(),
            caret,
            message,
        };
        self.emitter.borrow_mut().emit(&diag);
    }

    /// Errors reported so far.
    pub fn error_count(&self) -> u32 {
        self.errors.get()
    }

    /// Warnings reported so far.
    pub fn warning_count(&self) -> u32 {
        self.warnings.get()
    }

    /// Returns `true` once any error has been reported.
    pub fn has_errors(&self) -> bool {
        self.errors.get() > 0
    }
}

/// Caret covering a token's literal (at least one column).
fn token_caret(tok: &Token) -> Caret {
    let width = u32::try_from(tok.literal.len()).unwrap_or(u32::MAX);
    Caret::span(tok.loc.column, width.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_ir::{LineNote, NamePool, TokenKind};
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn loc_at(pool: &mut NamePool, line: u32, column: u32, text: &str) -> SourceLoc {
        let mut loc = SourceLoc::cleared();
        loc.mark(
            Some(pool.intern("t.c")),
            line,
            column,
            Some(LineNote::new(Rc::from(text.as_bytes()), 0)),
        );
        loc
    }

    // === Counters ===

    #[test]
    fn counts_errors_and_warnings_independently() {
        let mem = MemoryEmitter::new();
        let sink = DiagnosticSink::new(Box::new(mem.clone()));
        let loc = SourceLoc::cleared();
        sink.error_at(&loc, Caret::at(1), "one");
        sink.warning_at(&loc, Caret::at(1), "two");
        sink.error_at(&loc, Caret::at(1), "three");
        assert_eq!(sink.error_count(), 2);
        assert_eq!(sink.warning_count(), 1);
        assert!(sink.has_errors());
        assert_eq!(mem.messages(), vec!["one", "two", "three"]);
    }

    #[test]
    fn fresh_sink_has_no_errors() {
        let sink = DiagnosticSink::new(Box::new(MemoryEmitter::new()));
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 0);
    }

    // === Token-bound reports ===

    #[test]
    fn token_report_carries_token_position_and_width() {
        let mem = MemoryEmitter::new();
        let sink = DiagnosticSink::new(Box::new(mem.clone()));
        let mut pool = NamePool::new();
        let mut tok = Token::new();
        tok.kind = TokenKind::Identifier;
        tok.literal.push_bytes(b"abc");
        tok.loc = loc_at(&mut pool, 2, 5, "    abc");
        sink.error_at_token(&tok, "bad identifier");
        let diags = mem.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].caret, Caret::span(5, 3));
        assert_eq!(diags[0].loc.line, 2);
    }

    #[test]
    fn empty_literal_still_gets_one_caret_column() {
        let mem = MemoryEmitter::new();
        let sink = DiagnosticSink::new(Box::new(mem.clone()));
        let tok = Token::new();
        sink.warning_at_token(&tok, "w");
        assert_eq!(mem.diagnostics()[0].caret.width, 1);
    }

    // === Terminal rendering ===

    #[test]
    fn terminal_emitter_prints_line_and_caret() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut emitter = TerminalEmitter::new(&mut out);
            let mut pool = NamePool::new();
            let diag = Diagnostic {
                severity: Severity::Error,
                loc: loc_at(&mut pool, 1, 5, "int @ x;"),
                caret: Caret::at(5),
                message: "unexpected character".into(),
            };
            emitter.emit(&diag);
        }
        let text = String::from_utf8_lossy(&out);
        assert_eq!(
            text,
            "t.c:1:5: error: unexpected character\n int @ x;\n     ^\n"
        );
    }

    #[test]
    fn terminal_emitter_skips_line_without_note() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut emitter = TerminalEmitter::new(&mut out);
            let diag = Diagnostic {
                severity: Severity::Warning,
                loc: SourceLoc::cleared(),
                caret: Caret::at(1),
                message: "w".into(),
            };
            emitter.emit(&diag);
        }
        assert_eq!(String::from_utf8_lossy(&out), "<unknown>:0:0: warning: w\n");
    }
}

//! Diagnostics for the Cinder front end.
//!
//! The reader and lexer never buffer problems: each one is formatted and
//! emitted the moment it is discovered, bound to a token or a reader
//! position. Nothing here unwinds or aborts — the lexer keeps producing
//! tokens after every error so a single run can surface many problems.
//! Callers decide translation-unit failure by asking the sink for its
//! error count, not by inspecting return values.

mod diagnostic;
mod sink;

pub use diagnostic::{Caret, Diagnostic, Severity};
pub use sink::{DiagnosticSink, Emit, MemoryEmitter, TerminalEmitter};

//! The diagnostic value: severity, message, position, caret.

use cinder_ir::SourceLoc;

use std::fmt;

/// Severity level for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Where the caret points under the reprinted source line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Caret {
    /// 1-based column of the `^`.
    pub column: u32,
    /// Total marked width; columns past the first render as `~`.
    pub width: u32,
}

impl Caret {
    /// A single-column caret.
    pub fn at(column: u32) -> Self {
        Caret { column, width: 1 }
    }

    /// A caret spanning `width` columns.
    pub fn span(column: u32, width: u32) -> Self {
        Caret {
            column,
            width: width.max(1),
        }
    }
}

/// One formatted-and-forgotten diagnostic.
///
/// The location is a full [`SourceLoc`] (name, line, column, line note),
/// so an emitter can reprint the offending physical line with a caret.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub loc: SourceLoc,
    pub caret: Caret,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.loc, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn severity_displays_lowercase() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn caret_span_width_is_at_least_one() {
        assert_eq!(Caret::span(5, 0).width, 1);
        assert_eq!(Caret::span(5, 4).width, 4);
        assert_eq!(Caret::at(3), Caret { column: 3, width: 1 });
    }

    #[test]
    fn diagnostic_display_has_position_prefix() {
        let diag = Diagnostic {
            severity: Severity::Error,
            loc: SourceLoc::cleared(),
            caret: Caret::at(1),
            message: "boom".into(),
        };
        assert_eq!(diag.to_string(), "<unknown>:0:0: error: boom");
    }
}

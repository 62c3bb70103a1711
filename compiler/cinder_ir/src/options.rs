//! The fixed option bag the core consults.
//!
//! The core recognizes exactly these switches; anything richer (search
//! paths, dialect levels, output control) belongs to the driver and never
//! reaches the reader or lexer.

bitflags::bitflags! {
    /// Warning and dialect switches for the reader and lexer.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct Options: u32 {
        /// Warn when whitespace separates a backslash from the newline it
        /// splices.
        const WARN_BACKSLASH_NEWLINE_SPACE = 1 << 0;
        /// Warn on a backslash splice that runs into end of file (no final
        /// newline).
        const WARN_NO_NEWLINE_EOF = 1 << 1;
        /// Warn on the nonstandard `\e` escape (GNU extension).
        const STRICT_ESCAPES = 1 << 2;
    }
}

//! Lexical analyzer for the Cinder front end.
//!
//! The [`Lexer`] turns the reader's logical character stream into a lazy
//! sequence of [`Token`]s — one per call, never consuming past a token
//! boundary without producing a token. [`Lexer::scan`] is byte-faithful:
//! whitespace runs and comments come out as tokens of their own, so a
//! caller can reconstruct the phase-2 image of the source.
//! [`Lexer::next`] is what the preprocessor consumes: trivia collapses
//! into the following substantive token's `spaces` count and
//! beginning-of-line flag.
//!
//! On top of plain scanning sits a stack of *token stashes*: `untread`
//! pushes a token back to be re-delivered, and `stash`/`unstash` bracket
//! nested speculative lexing — the preprocessor peeks ahead through
//! macro-argument lists and abandons the attempt without losing tokens.
//! Stashes rewind tokens, not characters: raw reader calls made between
//! `stash` and `unstash` are not undone.
//!
//! Lexical problems never stop the lexer. Every error and warning goes to
//! the diagnostic sink bound at construction, and scanning continues so
//! one run can surface many problems.

#[cfg(test)]
mod tests;

use cinder_charbuf::CharBuf;
use cinder_diagnostic::{Caret, DiagnosticSink};
use cinder_ir::{Encoding, Options, SourceLoc, Token, TokenKind};
use cinder_reader::Reader;

use chrono::{DateTime, Local};
use smallvec::SmallVec;
use std::fmt::Write as _;
use std::rc::Rc;
use tracing::debug;

/// Identifier-continue byte: ASCII alphanumeric or underscore.
fn is_idnum(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Identifier-start byte (aside from universal character names).
fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' || (0x80..=0xFD).contains(&byte)
}

/// Horizontal whitespace; newlines are their own token.
fn is_hspace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | 0x0B | 0x0C)
}

fn hex_value(byte: u8) -> u32 {
    match byte {
        b'0'..=b'9' => u32::from(byte - b'0'),
        b'a'..=b'f' => u32::from(byte - b'a') + 10,
        _ => u32::from(byte - b'A') + 10,
    }
}

/// The in-progress token the lexer mutates while scanning.
///
/// Finalizing copies the contents into a freshly-owned [`Token`] and
/// resets this for the next scan, so per-token work reuses one
/// allocation. Never exposed to callers.
struct Scratch {
    literal: CharBuf,
    loc: SourceLoc,
    spaces: u32,
}

impl Scratch {
    fn new() -> Self {
        Scratch {
            literal: CharBuf::new(),
            loc: SourceLoc::cleared(),
            spaces: 0,
        }
    }

    fn reset(&mut self) {
        self.literal.clear();
        self.loc = SourceLoc::cleared();
        self.spaces = 0;
    }
}

/// Translates reader characters into tokens.
pub struct Lexer {
    reader: Reader,
    options: Options,
    sink: Rc<DiagnosticSink>,
    scratch: Scratch,
    /// Stack of rewind frames; the innermost is what `next` consults.
    /// The base frame is pushed at construction and never popped.
    stashes: SmallVec<[Vec<Token>; 4]>,
    /// Wall clock frozen at construction so every `__DATE__`/`__TIME__`
    /// expansion in one translation unit agrees.
    stamp: DateTime<Local>,
}

impl Lexer {
    /// Create a lexer over `reader`, reporting through `sink`.
    pub fn new(reader: Reader, options: Options, sink: Rc<DiagnosticSink>) -> Self {
        let mut stashes: SmallVec<[Vec<Token>; 4]> = SmallVec::new();
        stashes.push(Vec::new());
        Lexer {
            reader,
            options,
            sink,
            scratch: Scratch::new(),
            stashes,
            stamp: Local::now(),
        }
    }

    /// The underlying reader (the preprocessor pushes `#include` streams
    /// through this).
    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    /// Mutable access to the underlying reader.
    pub fn reader_mut(&mut self) -> &mut Reader {
        &mut self.reader
    }

    // ─── Token delivery ──────────────────────────────────────────────────

    /// Produce the next raw token, including whitespace and comment
    /// tokens.
    pub fn scan(&mut self) -> Token {
        self.mark_loc();

        if self.skip_whitespace() {
            return self.finish(TokenKind::Space);
        }

        let Some(ch) = self.reader.get() else {
            return self.finish(TokenKind::End);
        };

        match ch {
            b'\n' => self.finish(TokenKind::NewLine),
            b'[' => self.finish(TokenKind::LSquare),
            b']' => self.finish(TokenKind::RSquare),
            b'(' => self.finish(TokenKind::LParen),
            b')' => self.finish(TokenKind::RParen),
            b'{' => self.finish(TokenKind::LBrace),
            b'}' => self.finish(TokenKind::RBrace),
            b'.' => {
                if self.reader.peek().is_some_and(|c| c.is_ascii_digit()) {
                    return self.number(ch);
                }
                if self.reader.accept(b'.') {
                    if self.reader.accept(b'.') {
                        return self.finish(TokenKind::Ellipsis);
                    }
                    self.reader.unget(b'.');
                    return self.finish(TokenKind::Period);
                }
                self.finish(TokenKind::Period)
            }
            b'&' => {
                if self.reader.accept(b'&') {
                    return self.finish(TokenKind::AmpAmp);
                }
                if self.reader.accept(b'=') {
                    return self.finish(TokenKind::AmpEqual);
                }
                self.finish(TokenKind::Amp)
            }
            b'*' => {
                let kind = if self.reader.accept(b'=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                };
                self.finish(kind)
            }
            b'+' => {
                if self.reader.accept(b'+') {
                    return self.finish(TokenKind::PlusPlus);
                }
                if self.reader.accept(b'=') {
                    return self.finish(TokenKind::PlusEqual);
                }
                self.finish(TokenKind::Plus)
            }
            b'-' => {
                if self.reader.accept(b'>') {
                    return self.finish(TokenKind::Arrow);
                }
                if self.reader.accept(b'-') {
                    return self.finish(TokenKind::MinusMinus);
                }
                if self.reader.accept(b'=') {
                    return self.finish(TokenKind::MinusEqual);
                }
                self.finish(TokenKind::Minus)
            }
            b'~' => self.finish(TokenKind::Tilde),
            b'!' => {
                let kind = if self.reader.accept(b'=') {
                    TokenKind::ExclaimEqual
                } else {
                    TokenKind::Exclaim
                };
                self.finish(kind)
            }
            b'/' => {
                if self.reader.at(b'/') || self.reader.at(b'*') {
                    self.comment();
                    return self.finish(TokenKind::Comment);
                }
                let kind = if self.reader.accept(b'=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                };
                self.finish(kind)
            }
            b'%' => {
                if self.reader.accept(b'=') {
                    return self.finish(TokenKind::PercentEqual);
                }
                if self.reader.accept(b'>') {
                    return self.finish(TokenKind::RBrace);
                }
                if self.reader.accept(b':') {
                    if self.reader.accept(b'%') {
                        if self.reader.accept(b':') {
                            return self.finish(TokenKind::HashHash);
                        }
                        self.reader.unget(b'%');
                    }
                    return self.finish(TokenKind::Hash);
                }
                self.finish(TokenKind::Percent)
            }
            b'<' => {
                if self.reader.accept(b'<') {
                    let kind = if self.reader.accept(b'=') {
                        TokenKind::LessLessEqual
                    } else {
                        TokenKind::LessLess
                    };
                    return self.finish(kind);
                }
                if self.reader.accept(b'=') {
                    return self.finish(TokenKind::LessEqual);
                }
                if self.reader.accept(b':') {
                    return self.finish(TokenKind::LSquare);
                }
                if self.reader.accept(b'%') {
                    return self.finish(TokenKind::LBrace);
                }
                self.finish(TokenKind::Less)
            }
            b'>' => {
                if self.reader.accept(b'>') {
                    let kind = if self.reader.accept(b'=') {
                        TokenKind::GreaterGreaterEqual
                    } else {
                        TokenKind::GreaterGreater
                    };
                    return self.finish(kind);
                }
                if self.reader.accept(b'=') {
                    return self.finish(TokenKind::GreaterEqual);
                }
                self.finish(TokenKind::Greater)
            }
            b'^' => {
                let kind = if self.reader.accept(b'=') {
                    TokenKind::CaretEqual
                } else {
                    TokenKind::Caret
                };
                self.finish(kind)
            }
            b'|' => {
                if self.reader.accept(b'|') {
                    return self.finish(TokenKind::PipePipe);
                }
                if self.reader.accept(b'=') {
                    return self.finish(TokenKind::PipeEqual);
                }
                self.finish(TokenKind::Pipe)
            }
            b'?' => self.finish(TokenKind::Question),
            b':' => {
                let kind = if self.reader.accept(b'>') {
                    TokenKind::RSquare
                } else {
                    TokenKind::Colon
                };
                self.finish(kind)
            }
            b';' => self.finish(TokenKind::Semi),
            b'=' => {
                let kind = if self.reader.accept(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.finish(kind)
            }
            b',' => self.finish(TokenKind::Comma),
            b'#' => {
                let kind = if self.reader.accept(b'#') {
                    TokenKind::HashHash
                } else {
                    TokenKind::Hash
                };
                self.finish(kind)
            }
            b'0'..=b'9' => self.number(ch),
            b'u' | b'U' | b'L' => {
                let encoding = self.encoding_prefix(ch);
                if self.reader.accept(b'"') {
                    return self.string_literal(encoding);
                }
                if self.reader.accept(b'\'') {
                    return self.char_literal(encoding);
                }
                if encoding == Encoding::Utf8 {
                    self.reader.unget(b'8');
                }
                self.reader.unget(ch);
                self.identifier()
            }
            b'\'' => self.char_literal(Encoding::None),
            b'"' => self.string_literal(Encoding::None),
            b'\\' => {
                if self.reader.at(b'u') || self.reader.at(b'U') {
                    self.reader.unget(ch);
                    return self.identifier();
                }
                self.finish(TokenKind::Backslash)
            }
            _ => {
                if is_ident_start(ch) {
                    self.reader.unget(ch);
                    return self.identifier();
                }
                self.scratch.literal.push(ch);
                self.error_here("unexpected character");
                self.finish(TokenKind::Unknown)
            }
        }
    }

    /// Produce the next substantive token: the active stash first, then a
    /// fresh scan with whitespace and comment runs collapsed into the
    /// returned token's `spaces` count and beginning-of-line flag.
    pub fn next(&mut self) -> Token {
        if let Some(frame) = self.stashes.last_mut() {
            if let Some(tok) = frame.pop() {
                return tok;
            }
        }

        let bol = self.reader.line() == Some(1);

        let mut tok = self.scan();
        let mut leading = 0u32;
        while tok.kind.is_trivia() {
            tok = self.scan();
            leading += 1;
        }

        tok.bol = bol;
        tok.spaces = leading;
        tok
    }

    /// Look at the next substantive token without consuming it.
    pub fn peek(&mut self) -> Token {
        let tok = self.next();
        if tok.kind != TokenKind::End {
            self.untread(tok.clone());
        }
        tok
    }

    /// Push a token back; the next `next` returns it. End of input is not
    /// stashable.
    pub fn untread(&mut self, tok: Token) {
        debug_assert!(tok.kind != TokenKind::End, "untread of end-of-input token");
        if let Some(frame) = self.stashes.last_mut() {
            frame.push(tok);
        }
    }

    /// Open a nested rewind frame for speculative lexing.
    pub fn stash(&mut self) {
        self.stashes.push(Vec::new());
        debug!(depth = self.stashes.len(), "stash frame pushed");
    }

    /// Close the innermost rewind frame, draining its tokens.
    ///
    /// The base frame stays; `unstash` must balance a prior `stash`.
    pub fn unstash(&mut self) {
        debug_assert!(self.stashes.len() > 1, "unstash without matching stash");
        if self.stashes.len() > 1 {
            if let Some(frame) = self.stashes.pop() {
                debug!(
                    depth = self.stashes.len(),
                    dropped = frame.len(),
                    "stash frame dropped"
                );
            }
        }
    }

    // ─── Build date/time snapshot ────────────────────────────────────────

    /// The build date frozen at construction, in `"Mmm dd yyyy"` form
    /// (day space-padded) — the `__DATE__` spelling.
    pub fn date(&self) -> CharBuf {
        let mut buf = CharBuf::new();
        let _ = write!(buf, "{}", self.stamp.format("%b %e %Y"));
        buf
    }

    /// The build time frozen at construction, `"hh:mm:ss"` — the
    /// `__TIME__` spelling.
    pub fn time(&self) -> CharBuf {
        let mut buf = CharBuf::new();
        let _ = write!(buf, "{}", self.stamp.format("%H:%M:%S"));
        buf
    }

    // ─── Scratch token plumbing ──────────────────────────────────────────

    /// Pin the prospective token to the reader's current position.
    fn mark_loc(&mut self) {
        match self.reader.position() {
            Some(pos) => self
                .scratch
                .loc
                .mark(Some(pos.name), pos.line, pos.column, Some(pos.note)),
            None => self.scratch.loc = SourceLoc::cleared(),
        }
    }

    /// Move the scratch location to the reader's current position while
    /// keeping the source name; errors inside an escape sequence point at
    /// the escape, not at the token's start.
    fn remark_loc(&mut self) {
        if let Some(pos) = self.reader.position() {
            self.scratch.loc.remark(pos.line, pos.column, Some(pos.note));
        }
    }

    /// Finalize the scratch state into a freshly-owned token and reset the
    /// scratch for the next scan.
    fn finish(&mut self, kind: TokenKind) -> Token {
        let tok = Token {
            kind,
            literal: self.scratch.literal.clone(),
            loc: self.scratch.loc.clone(),
            bol: false,
            spaces: self.scratch.spaces,
            hideset: None,
        };
        self.scratch.reset();
        tok
    }

    fn error_here(&self, message: impl Into<String>) {
        let width = u32::try_from(self.scratch.literal.len()).unwrap_or(u32::MAX);
        self.sink.error_at(
            &self.scratch.loc,
            Caret::span(self.scratch.loc.column, width.max(1)),
            message,
        );
    }

    fn warning_here(&self, message: impl Into<String>) {
        let width = u32::try_from(self.scratch.literal.len()).unwrap_or(u32::MAX);
        self.sink.warning_at(
            &self.scratch.loc,
            Caret::span(self.scratch.loc.column, width.max(1)),
            message,
        );
    }

    // ─── Trivia ──────────────────────────────────────────────────────────

    /// Consume a run of horizontal whitespace into the scratch `spaces`
    /// counter. Newlines stay put; they are tokens of their own so the
    /// preprocessor can see directive boundaries.
    fn skip_whitespace(&mut self) -> bool {
        while let Some(ch) = self.reader.peek() {
            if ch == b'\n' || !is_hspace(ch) {
                break;
            }
            let _ = self.reader.get();
            self.scratch.spaces += 1;
        }
        self.scratch.spaces > 0
    }

    /// Consume a `//` or `/*` comment into the scratch literal. The
    /// leading `/` is already consumed; the terminating newline of a line
    /// comment is not part of the comment.
    fn comment(&mut self) {
        self.scratch.literal.push(b'/');
        if self.reader.accept(b'/') {
            self.scratch.literal.push(b'/');
            while let Some(ch) = self.reader.peek() {
                if ch == b'\n' {
                    break;
                }
                let _ = self.reader.get();
                self.scratch.literal.push(ch);
            }
        } else if self.reader.accept(b'*') {
            self.scratch.literal.push(b'*');
            loop {
                let Some(ch) = self.reader.get() else {
                    self.error_here("unterminated comment");
                    break;
                };
                self.scratch.literal.push(ch);
                if ch == b'*' && self.reader.accept(b'/') {
                    self.scratch.literal.push(b'/');
                    break;
                }
            }
        }
    }

    // ─── Numbers ─────────────────────────────────────────────────────────

    /// Preprocessing number: deliberately looser than the numeric-constant
    /// grammar. Anything identifier-like, dots, digit separators, and
    /// signs right after an exponent letter all continue the token.
    fn number(&mut self, first: u8) -> Token {
        let mut prev = 0u8;
        self.scratch.literal.push(first);
        while let Some(ch) = self.reader.peek() {
            let exponent_sign =
                (ch == b'+' || ch == b'-') && matches!(prev, b'e' | b'E' | b'p' | b'P');
            if !(is_idnum(ch) || ch == b'.' || ch == b'\'' || exponent_sign) {
                break;
            }
            self.scratch.literal.push(ch);
            prev = ch;
            let _ = self.reader.get();
        }
        self.finish(TokenKind::Number)
    }

    // ─── Identifiers ─────────────────────────────────────────────────────

    /// Maximal run of identifier-continue characters. `\uXXXX`/`\UXXXXXXXX`
    /// escapes decode to a code point and land in the literal as UTF-8.
    fn identifier(&mut self) -> Token {
        loop {
            let Some(ch) = self.reader.get() else {
                break;
            };
            if is_idnum(ch) || ch == b'$' || (0x80..=0xFD).contains(&ch) {
                self.scratch.literal.push(ch);
                continue;
            }
            if ch == b'\\' && (self.reader.at(b'u') || self.reader.at(b'U')) {
                let rune = self.escape();
                self.push_rune(rune);
                continue;
            }
            self.reader.unget(ch);
            break;
        }
        self.finish(TokenKind::Identifier)
    }

    // ─── Character and string constants ──────────────────────────────────

    /// The prefix character `u`, `U`, or `L` is consumed; a following `8`
    /// upgrades `u` to the UTF-8 prefix.
    fn encoding_prefix(&mut self, ch: u8) -> Encoding {
        match ch {
            b'u' => {
                if self.reader.accept(b'8') {
                    Encoding::Utf8
                } else {
                    Encoding::Char16
                }
            }
            b'U' => Encoding::Char32,
            _ => Encoding::Wchar,
        }
    }

    /// Character constant; the opening quote is consumed. Only the first
    /// logical character is kept, but scanning continues to the closing
    /// quote so the token boundary is right.
    fn char_literal(&mut self, encoding: Encoding) -> Token {
        let mut parsed = false;
        let mut terminated = false;

        loop {
            let Some(ch) = self.reader.get() else {
                break;
            };
            if ch == b'\'' {
                terminated = true;
                break;
            }
            if ch == b'\n' {
                break;
            }
            if parsed {
                continue;
            }
            if ch == b'\\' {
                let is_ucn = self.reader.at(b'u') || self.reader.at(b'U');
                let value = self.escape();
                if is_ucn {
                    self.push_rune(value);
                } else {
                    self.scratch.literal.push((value & 0xFF) as u8);
                }
                parsed = true;
                continue;
            }
            self.scratch.literal.push(ch);
            parsed = true;
        }

        if !terminated {
            self.error_here("missing terminating ' character");
        }
        if !parsed {
            self.error_here("empty character constant");
        }

        self.finish(match encoding {
            Encoding::Char16 => TokenKind::Char16Const,
            Encoding::Char32 => TokenKind::Char32Const,
            Encoding::Utf8 => TokenKind::Utf8CharConst,
            Encoding::Wchar => TokenKind::WcharConst,
            Encoding::None => TokenKind::CharConst,
        })
    }

    /// String literal; the opening quote is consumed. The literal holds
    /// the decoded bytes, quotes and prefix stripped.
    fn string_literal(&mut self, encoding: Encoding) -> Token {
        let mut terminated = false;

        loop {
            let Some(ch) = self.reader.get() else {
                break;
            };
            if ch == b'"' {
                terminated = true;
                break;
            }
            if ch == b'\n' {
                break;
            }
            if ch == b'\\' {
                let is_ucn = self.reader.at(b'u') || self.reader.at(b'U');
                let value = self.escape();
                if is_ucn {
                    self.push_rune(value);
                } else {
                    self.scratch.literal.push((value & 0xFF) as u8);
                }
                continue;
            }
            self.scratch.literal.push(ch);
        }

        if !terminated {
            self.error_here("unterminated string literal");
        }

        self.finish(match encoding {
            Encoding::Char16 => TokenKind::String16Const,
            Encoding::Char32 => TokenKind::String32Const,
            Encoding::Utf8 => TokenKind::Utf8StringConst,
            Encoding::Wchar => TokenKind::WstringConst,
            Encoding::None => TokenKind::StringConst,
        })
    }

    // ─── Escape sequences ────────────────────────────────────────────────

    /// The backslash is consumed; resolve the escape to a value. Simple
    /// escapes yield their byte, `\x`/octal fold digit runs, `\u`/`\U`
    /// yield a code point.
    fn escape(&mut self) -> u32 {
        self.remark_loc();

        let Some(ch) = self.reader.get() else {
            self.warning_here("unknown escape character");
            return 0;
        };
        match ch {
            b'\'' | b'"' | b'?' | b'\\' => ch.into(),
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => 0x0A,
            b'r' => 0x0D,
            b't' => 0x09,
            b'v' => 0x0B,
            b'e' | b'E' => {
                // '\e' is a GNU extension
                if self.options.contains(Options::STRICT_ESCAPES) {
                    self.warning_here("nonstandard escape sequence '\\e'");
                }
                0x1B
            }
            b'x' => self.hex_escape(),
            b'u' => self.ucn(4),
            b'U' => self.ucn(8),
            b'0'..=b'7' => self.octal_escape(ch),
            _ => {
                self.warning_here(format!("unknown escape character: '{}'", char::from(ch)));
                ch.into()
            }
        }
    }

    /// `\x`: at least one hex digit required, maximal run consumed, value
    /// folded with wraparound (the width is the consumer's problem).
    fn hex_escape(&mut self) -> u32 {
        if !self.reader.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.error_here("\\x used with no following hex digits");
        }
        let mut value = 0u32;
        while let Some(ch) = self.reader.peek() {
            if !ch.is_ascii_hexdigit() {
                break;
            }
            value = value.wrapping_shl(4).wrapping_add(hex_value(ch));
            let _ = self.reader.get();
        }
        value
    }

    /// Octal escape: the first digit is consumed, up to two more follow.
    fn octal_escape(&mut self, first: u8) -> u32 {
        let mut value = u32::from(first - b'0');
        for _ in 0..2 {
            match self.reader.peek() {
                Some(ch) if (b'0'..=b'7').contains(&ch) => {
                    value = (value << 3) + u32::from(ch - b'0');
                    let _ = self.reader.get();
                }
                _ => break,
            }
        }
        value
    }

    /// Universal character name: exactly `len` hex digits after `\u`/`\U`.
    /// A non-hex byte is an error and stays unconsumed, so a closing quote
    /// right after a bad digit still terminates the literal.
    fn ucn(&mut self, len: u32) -> u32 {
        debug_assert!(len == 4 || len == 8);
        self.remark_loc();

        let mut value = 0u32;
        for _ in 0..len {
            match self.reader.peek() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    value = (value << 4) + hex_value(ch);
                    let _ = self.reader.get();
                }
                _ => {
                    self.error_here("invalid universal character");
                    break;
                }
            }
        }
        value
    }

    /// Append a decoded code point to the literal as UTF-8.
    fn push_rune(&mut self, rune: u32) {
        if self.scratch.literal.push_utf8(rune).is_err() {
            self.error_here("invalid universal character");
        }
    }
}

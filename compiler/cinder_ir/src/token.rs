//! Token kinds and the value-typed token.
//!
//! [`TokenKind`] is the sole discriminator: the literal text of a token
//! may or may not carry information beyond what the kind implies.
//! Punctuation carries no literal; identifiers, numbers, and string or
//! character constants always do (for constants, the literal is the
//! *decoded* content — escapes resolved, quotes and encoding prefix
//! stripped).
//!
//! Digraphs are canonicalized at lex time: `<:` produces [`TokenKind::LSquare`],
//! `%:` produces [`TokenKind::Hash`], and so on. No token ever reports an
//! alternative spelling.

use crate::SourceLoc;
use cinder_charbuf::CharBuf;

/// What kind of token this is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    // === Structural ===
    /// `[`
    LSquare,
    /// `]`
    RSquare,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `:`
    Colon,
    /// `?`
    Question,

    // === Operators ===
    /// `.`
    Period,
    /// `...`
    Ellipsis,
    /// `&`
    Amp,
    /// `&&`
    AmpAmp,
    /// `&=`
    AmpEqual,
    /// `*`
    Star,
    /// `*=`
    StarEqual,
    /// `+`
    Plus,
    /// `++`
    PlusPlus,
    /// `+=`
    PlusEqual,
    /// `-`
    Minus,
    /// `--`
    MinusMinus,
    /// `-=`
    MinusEqual,
    /// `->`
    Arrow,
    /// `~`
    Tilde,
    /// `!`
    Exclaim,
    /// `!=`
    ExclaimEqual,
    /// `/`
    Slash,
    /// `/=`
    SlashEqual,
    /// `%`
    Percent,
    /// `%=`
    PercentEqual,
    /// `<`
    Less,
    /// `<<`
    LessLess,
    /// `<<=`
    LessLessEqual,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>>`
    GreaterGreater,
    /// `>>=`
    GreaterGreaterEqual,
    /// `>=`
    GreaterEqual,
    /// `^`
    Caret,
    /// `^=`
    CaretEqual,
    /// `|`
    Pipe,
    /// `||`
    PipePipe,
    /// `|=`
    PipeEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,

    // === Preprocessor glyphs ===
    /// `#` (also the canonical form of `%:`)
    Hash,
    /// `##` (also the canonical form of `%:%:`)
    HashHash,
    /// `\` not starting a universal character name
    Backslash,

    // === Trivia ===
    /// Run of horizontal whitespace; the run length rides in the token's
    /// `spaces` field.
    Space,
    /// One logical newline.
    NewLine,
    /// Line or block comment; the literal holds the full comment text.
    Comment,
    /// End of input.
    End,

    // === Atoms ===
    /// Identifier (universal character names already decoded to UTF-8).
    Identifier,
    /// Preprocessing number (permissive superset of numeric constants).
    Number,
    /// `'...'`
    CharConst,
    /// `L'...'`
    WcharConst,
    /// `u'...'`
    Char16Const,
    /// `U'...'`
    Char32Const,
    /// `u8'...'`
    Utf8CharConst,
    /// `"..."`
    StringConst,
    /// `L"..."`
    WstringConst,
    /// `u"..."`
    String16Const,
    /// `U"..."`
    String32Const,
    /// `u8"..."`
    Utf8StringConst,

    // === Sentinel ===
    /// Cleared scratch state, or a byte the dispatch table rejects.
    Unknown,
}

impl TokenKind {
    /// The canonical source spelling for simple tokens.
    ///
    /// Identifiers, numbers, constants, whitespace runs, comments, and the
    /// sentinels return `None` — their text varies. Used by diagnostics
    /// and by preprocessor stringization upstream.
    #[must_use]
    pub fn spelling(self) -> Option<&'static str> {
        match self {
            Self::LSquare => Some("["),
            Self::RSquare => Some("]"),
            Self::LParen => Some("("),
            Self::RParen => Some(")"),
            Self::LBrace => Some("{"),
            Self::RBrace => Some("}"),
            Self::Comma => Some(","),
            Self::Semi => Some(";"),
            Self::Colon => Some(":"),
            Self::Question => Some("?"),
            Self::Period => Some("."),
            Self::Ellipsis => Some("..."),
            Self::Amp => Some("&"),
            Self::AmpAmp => Some("&&"),
            Self::AmpEqual => Some("&="),
            Self::Star => Some("*"),
            Self::StarEqual => Some("*="),
            Self::Plus => Some("+"),
            Self::PlusPlus => Some("++"),
            Self::PlusEqual => Some("+="),
            Self::Minus => Some("-"),
            Self::MinusMinus => Some("--"),
            Self::MinusEqual => Some("-="),
            Self::Arrow => Some("->"),
            Self::Tilde => Some("~"),
            Self::Exclaim => Some("!"),
            Self::ExclaimEqual => Some("!="),
            Self::Slash => Some("/"),
            Self::SlashEqual => Some("/="),
            Self::Percent => Some("%"),
            Self::PercentEqual => Some("%="),
            Self::Less => Some("<"),
            Self::LessLess => Some("<<"),
            Self::LessLessEqual => Some("<<="),
            Self::LessEqual => Some("<="),
            Self::Greater => Some(">"),
            Self::GreaterGreater => Some(">>"),
            Self::GreaterGreaterEqual => Some(">>="),
            Self::GreaterEqual => Some(">="),
            Self::Caret => Some("^"),
            Self::CaretEqual => Some("^="),
            Self::Pipe => Some("|"),
            Self::PipePipe => Some("||"),
            Self::PipeEqual => Some("|="),
            Self::Equal => Some("="),
            Self::EqualEqual => Some("=="),
            Self::Hash => Some("#"),
            Self::HashHash => Some("##"),
            Self::Backslash => Some("\\"),
            Self::NewLine => Some("\n"),
            _ => None,
        }
    }

    /// A short human-readable name for diagnostics and debugging.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LSquare => "`[`",
            Self::RSquare => "`]`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::Comma => "`,`",
            Self::Semi => "`;`",
            Self::Colon => "`:`",
            Self::Question => "`?`",
            Self::Period => "`.`",
            Self::Ellipsis => "`...`",
            Self::Amp => "`&`",
            Self::AmpAmp => "`&&`",
            Self::AmpEqual => "`&=`",
            Self::Star => "`*`",
            Self::StarEqual => "`*=`",
            Self::Plus => "`+`",
            Self::PlusPlus => "`++`",
            Self::PlusEqual => "`+=`",
            Self::Minus => "`-`",
            Self::MinusMinus => "`--`",
            Self::MinusEqual => "`-=`",
            Self::Arrow => "`->`",
            Self::Tilde => "`~`",
            Self::Exclaim => "`!`",
            Self::ExclaimEqual => "`!=`",
            Self::Slash => "`/`",
            Self::SlashEqual => "`/=`",
            Self::Percent => "`%`",
            Self::PercentEqual => "`%=`",
            Self::Less => "`<`",
            Self::LessLess => "`<<`",
            Self::LessLessEqual => "`<<=`",
            Self::LessEqual => "`<=`",
            Self::Greater => "`>`",
            Self::GreaterGreater => "`>>`",
            Self::GreaterGreaterEqual => "`>>=`",
            Self::GreaterEqual => "`>=`",
            Self::Caret => "`^`",
            Self::CaretEqual => "`^=`",
            Self::Pipe => "`|`",
            Self::PipePipe => "`||`",
            Self::PipeEqual => "`|=`",
            Self::Equal => "`=`",
            Self::EqualEqual => "`==`",
            Self::Hash => "`#`",
            Self::HashHash => "`##`",
            Self::Backslash => "`\\`",
            Self::Space => "whitespace",
            Self::NewLine => "newline",
            Self::Comment => "comment",
            Self::End => "end of input",
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::CharConst => "character constant",
            Self::WcharConst => "wide character constant",
            Self::Char16Const => "char16_t character constant",
            Self::Char32Const => "char32_t character constant",
            Self::Utf8CharConst => "UTF-8 character constant",
            Self::StringConst => "string literal",
            Self::WstringConst => "wide string literal",
            Self::String16Const => "char16_t string literal",
            Self::String32Const => "char32_t string literal",
            Self::Utf8StringConst => "UTF-8 string literal",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `true` for the trivia kinds `next()` collapses into the
    /// following substantive token.
    ///
    /// Newlines are NOT trivia — the preprocessor needs them to terminate
    /// directives.
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Space | Self::Comment)
    }
}

/// Element encoding of a character or string constant, selected by the
/// prefix byte(s) immediately before the opening quote.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Encoding {
    /// No prefix.
    #[default]
    None,
    /// `u8` prefix.
    Utf8,
    /// `u` prefix.
    Char16,
    /// `U` prefix.
    Char32,
    /// `L` prefix.
    Wchar,
}

/// Opaque handle to a preprocessor hide set.
///
/// The lexer carries this as inert payload: it never reads, writes, or
/// invents one. Ownership and meaning belong entirely to the macro
/// expander upstream.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HideSetId(pub u32);

/// One token: kind, decoded literal, location, and trivia metadata.
///
/// Tokens are value types. [`Clone`] deep-copies the literal and location;
/// dropping a token releases both. Whoever receives a token from the lexer
/// owns it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    /// Decoded literal text; empty for pure punctuation.
    pub literal: CharBuf,
    pub loc: SourceLoc,
    /// Set by `next()` when the token is the first on line 1 of its stream.
    pub bol: bool,
    /// For [`TokenKind::Space`]: the whitespace run length. For substantive
    /// tokens from `next()`: the number of collapsed trivia tokens.
    pub spaces: u32,
    /// Opaque preprocessor annotation; `None` until the macro expander
    /// assigns one.
    pub hideset: Option<HideSetId>,
}

impl Token {
    /// A cleared token: [`TokenKind::Unknown`], empty literal, zeroed
    /// location.
    pub fn new() -> Self {
        Token {
            kind: TokenKind::Unknown,
            literal: CharBuf::new(),
            loc: SourceLoc::cleared(),
            bol: false,
            spaces: 0,
            hideset: None,
        }
    }

    /// The token's text as it should appear when reprinted: the literal if
    /// it carries one, otherwise the kind's canonical spelling.
    ///
    /// [`TokenKind::Space`] reprints as `spaces` spaces.
    pub fn reprint(&self) -> CharBuf {
        if self.kind == TokenKind::Space {
            let mut out = CharBuf::with_capacity(self.spaces as usize);
            for _ in 0..self.spaces {
                out.push(b' ');
            }
            return out;
        }
        if !self.literal.is_empty() {
            return self.literal.clone();
        }
        match self.kind.spelling() {
            Some(s) => CharBuf::from(s),
            None => CharBuf::new(),
        }
    }
}

impl Default for Token {
    fn default() -> Self {
        Token::new()
    }
}

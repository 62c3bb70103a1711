//! Shared data model for the Cinder front end.
//!
//! Everything the reader, lexer, preprocessor, and diagnostics agree on
//! lives here: the exhaustive [`TokenKind`] enumeration, the value-typed
//! [`Token`], source locations with caret-quality line notes, the interned
//! source-name pool, and the fixed option bag the core consults.
//!
//! This crate holds no behavior beyond its data types; the reader and
//! lexer drive it.

mod loc;
mod name;
mod options;
mod times;
mod token;

pub use loc::{LineNote, SourceLoc};
pub use name::{NamePool, SourceName};
pub use options::Options;
pub use times::FileTimes;
pub use token::{Encoding, HideSetId, Token, TokenKind};

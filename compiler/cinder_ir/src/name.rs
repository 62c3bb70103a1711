//! Interned source names.
//!
//! Every stream, location, and diagnostic refers to its source by an
//! interned name. The pool is append-only: handles stay valid for the
//! pool's whole lifetime, and interning the same text twice yields handles
//! sharing one allocation, so a translation unit with thousands of tokens
//! carries one copy of each file name.

use rustc_hash::FxHashSet;
use std::fmt;
use std::rc::Rc;

/// A cheaply-cloneable interned source name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SourceName(Rc<str>);

impl SourceName {
    /// The name's text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if both handles share one interned allocation.
    pub fn identical(&self, other: &SourceName) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only pool of interned source names.
///
/// Mutated only when a stream is pushed; shared read-only everywhere else.
#[derive(Default, Debug)]
pub struct NamePool {
    names: FxHashSet<Rc<str>>,
}

impl NamePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        NamePool::default()
    }

    /// Intern `text`, returning a handle that shares storage with every
    /// other handle for the same text.
    pub fn intern(&mut self, text: &str) -> SourceName {
        if let Some(existing) = self.names.get(text) {
            return SourceName(Rc::clone(existing));
        }
        let name: Rc<str> = Rc::from(text);
        self.names.insert(Rc::clone(&name));
        SourceName(name)
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

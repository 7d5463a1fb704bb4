//! Process-wide string interner.
//!
//! Flag names, command names and short codes are looked up on every token of
//! every parse, so the table is built to make repeat lookups of already-known
//! strings allocation-free: the hot path takes a shared read lock, and only
//! promotes to the exclusive write lock when a string hasn't been seen before
//! (and re-checks existence once it has the lock, since another writer may
//! have raced it in).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

/// A canonical, cheaply-cloneable handle to an interned string.
///
/// Two `Sym`s compare equal iff they were interned from byte-identical
/// content; comparison never touches the table.
#[derive(Clone, Eq)]
pub struct Sym(Arc<str>);

impl Sym {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Sym {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl std::hash::Hash for Sym {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Debug for Sym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sym({:?})", self.0)
    }
}

impl std::fmt::Display for Sym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for Sym {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One-character canonical values for every ASCII letter and digit, indexed
/// by `(byte - b'0')`-ish bucketing; built once and shared by every interner.
struct AsciiTable([Sym; 128]);

fn build_ascii_table() -> AsciiTable {
    let mut v: Vec<Sym> = Vec::with_capacity(128);
    for b in 0u8..128 {
        v.push(Sym(Arc::from((b as char).to_string().as_str())));
    }
    AsciiTable(v.try_into().unwrap_or_else(|_| unreachable!()))
}

static ASCII: Lazy<AsciiTable> = Lazy::new(build_ascii_table);

#[derive(Default)]
struct InternerInner {
    table: HashMap<Arc<str>, Sym>,
}

/// A string-interning table. Reader-writer discipline: `intern` takes the
/// shared lock first and only escalates to the exclusive lock for strings it
/// hasn't seen, re-checking existence once it holds the write lock.
pub struct Interner {
    inner: RwLock<InternerInner>,
}

impl Interner {
    fn empty() -> Self {
        Interner {
            inner: RwLock::new(InternerInner::default()),
        }
    }

    /// Build a private interner, for tests or embedders who don't want to
    /// touch the process-wide singleton.
    pub fn local() -> Self {
        Self::empty()
    }

    /// Canonicalize `input`, inserting it into the table if this is the
    /// first time it has been seen.
    pub fn intern(&self, input: &str) -> Sym {
        if let Some(sym) = self.inner.read().unwrap().table.get(input) {
            return sym.clone();
        }
        let mut guard = self.inner.write().unwrap();
        if let Some(sym) = guard.table.get(input) {
            return sym.clone();
        }
        let arc: Arc<str> = Arc::from(input);
        let sym = Sym(arc.clone());
        guard.table.insert(arc, sym.clone());
        sym
    }

    /// Intern a single byte without ever touching the table when it's an
    /// ASCII letter or digit — those come from a precomputed table.
    pub fn intern_byte(&self, b: u8) -> Sym {
        if b.is_ascii_alphanumeric() && (b as usize) < ASCII.0.len() {
            return ASCII.0[b as usize].clone();
        }
        let s = (b as char).to_string();
        self.intern(&s)
    }

    /// Bulk-load a set of strings, e.g. during application build, so the
    /// first real parse never pays an insertion cost.
    pub fn pre_intern<'a, I: IntoIterator<Item = &'a str>>(&self, seq: I) {
        for s in seq {
            self.intern(s);
        }
    }

    #[cfg(test)]
    pub fn stats(&self) -> usize {
        self.inner.read().unwrap().table.len()
    }

    #[cfg(test)]
    pub fn clear(&self) {
        self.inner.write().unwrap().table.clear();
    }
}

static GLOBAL: Lazy<Interner> = Lazy::new(Interner::empty);

/// The process-wide interner used by [`crate::model`] and
/// [`crate::parser`] unless an embedder builds its own.
pub fn global() -> &'static Interner {
    &GLOBAL
}

/// Touch the global interner and the ASCII table so the first real parse
/// doesn't pay for lazy initialization. Applications may call this during
/// startup; there is no way to observe "is it warm" from user code.
pub fn pre_warm() {
    Lazy::force(&ASCII);
    Lazy::force(&GLOBAL);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_interns_to_equal_symbol() {
        let interner = Interner::local();
        let a = interner.intern("verbose");
        let b = interner.intern("verbose");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_grow_the_table_by_exactly_one_each() {
        let interner = Interner::local();
        for name in ["a", "b", "c", "a", "b", "d"] {
            interner.intern(name);
        }
        assert_eq!(interner.stats(), 4);
    }

    #[test]
    fn intern_byte_skips_table_for_alphanumerics() {
        let interner = Interner::local();
        let sym = interner.intern_byte(b'v');
        assert_eq!(sym.as_str(), "v");
        // the ascii table is shared process-wide and pre-built, so looking
        // up a letter must not have inserted anything into this interner's
        // own table.
        assert_eq!(interner.stats(), 0);
    }

    #[test]
    fn intern_byte_falls_back_for_non_alphanumeric() {
        let interner = Interner::local();
        let sym = interner.intern_byte(b'-');
        assert_eq!(sym.as_str(), "-");
        assert_eq!(interner.stats(), 1);
    }

    #[test]
    fn pre_intern_bulk_loads() {
        let interner = Interner::local();
        interner.pre_intern(["port", "verbose", "name"]);
        assert_eq!(interner.stats(), 3);
        assert_eq!(interner.intern("port"), interner.intern("port"));
    }
}

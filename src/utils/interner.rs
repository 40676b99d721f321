//! Global String Interner
//!
//! Chunk names and feature-flag keys are interned into compact [`Symbol`]s so
//! that registry lookups and flag-set comparisons are integer operations.

use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Compact integer identifier of an interned string.
pub type Symbol = Spur;

/// Interns `s`, returning the existing symbol if it was seen before.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns the flag names used by the built-in chunks.
///
/// Called once when a context loads the built-in library so the hot build
/// path does not allocate for them.
pub fn preload_builtin_flags() {
    let common = [
        "USE_FOG",
        "USE_GAMMA",
        "USE_TONE_MAPPING",
        "USE_VERTEX_COLOR",
        "USE_NORMAL",
        "USE_UV",
        "USE_SKINNING",
        "USE_INSTANCING",
        "GAMMA",
        "MAX_LIGHTS",
    ];

    for name in common {
        intern(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("hello");
        let s2 = intern("hello");
        let s3 = intern("world");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "hello");
        assert_eq!(resolve(s3), "world");
    }

    #[test]
    fn test_get() {
        let _ = intern("existing_chunk_name");

        assert!(get("existing_chunk_name").is_some());
        assert!(get("never_interned_chunk_name").is_none());
    }
}

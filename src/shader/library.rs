//! Chunk Library
//!
//! Registry mapping chunk name → [`Chunk`]. Names are interned, so lookups of
//! names that were never interned fail without allocating.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::assets;
use super::chunk::Chunk;
use crate::utils::interner::{self, Symbol};

#[derive(Debug, Clone, Default)]
pub struct ChunkLibrary {
    chunks: FxHashMap<Symbol, Arc<Chunk>>,
}

impl ChunkLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a library pre-populated with the built-in chunk set.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut library = Self::new();
        library.register_builtin();
        library
    }

    /// Registers every embedded built-in chunk. Returns how many were added.
    pub fn register_builtin(&mut self) -> usize {
        interner::preload_builtin_flags();
        let sources = assets::builtin_chunk_sources();
        let count = sources.len();
        for (name, source) in sources {
            self.add(Chunk::new(name, source));
        }
        log::debug!("Registered {count} built-in shader chunks");
        count
    }

    /// Stores `chunk` by name. Last write wins; the replaced chunk is returned.
    pub fn add(&mut self, chunk: Chunk) -> Option<Arc<Chunk>> {
        let previous = self.chunks.insert(chunk.symbol(), Arc::new(chunk));
        if let Some(prev) = &previous {
            log::debug!("Shader chunk '{}' replaced", prev.name());
        }
        previous
    }

    /// Registers several chunks in order.
    pub fn extend(&mut self, chunks: impl IntoIterator<Item = Chunk>) {
        for chunk in chunks {
            self.add(chunk);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Chunk>> {
        interner::get(name).and_then(|sym| self.get_symbol(sym))
    }

    #[inline]
    #[must_use]
    pub fn get_symbol(&self, name: Symbol) -> Option<Arc<Chunk>> {
        self.chunks.get(&name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        interner::get(name).is_some_and(|sym| self.chunks.contains_key(&sym))
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Chunk>> {
        interner::get(name).and_then(|sym| self.chunks.remove(&sym))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.chunks.values().map(|c| c.name()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::Stage;

    #[test]
    fn test_add_and_get() {
        let mut library = ChunkLibrary::new();
        library.add(Chunk::new("lib_tint", "@fragment {{ color = color * 0.5; }}"));

        let chunk = library.get("lib_tint").unwrap();
        assert_eq!(chunk.code(Stage::Fragment), "color = color * 0.5;");
        assert!(library.contains("lib_tint"));
        assert!(library.get("lib_missing_chunk").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let mut library = ChunkLibrary::new();
        assert!(library.add(Chunk::new("lib_dup", "@vertex {{ a(); }}")).is_none());
        let previous = library.add(Chunk::new("lib_dup", "@vertex {{ b(); }}"));

        assert_eq!(previous.unwrap().code(Stage::Vertex), "a();");
        assert_eq!(library.get("lib_dup").unwrap().code(Stage::Vertex), "b();");
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_builtin_set() {
        let library = ChunkLibrary::with_builtin();
        assert!(library.contains("transform"));
        assert!(library.contains("math"));
        assert!(library.get("math").unwrap().is_declaration_only());
        assert_eq!(library.names().len(), library.len());
    }
}

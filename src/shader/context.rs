//! Compiler Context
//!
//! Owns everything a build needs: the chunk library, the struct registry,
//! the settings and the compiled-shader cache. One context is typically
//! created at startup, filled with chunks and structs, then shared by every
//! material.
//!
//! The cache is keyed by [`ShaderConfig::config_hash`]. Identical
//! configurations yield the same `Arc<CompiledShader>`; failed builds are
//! never cached.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

use super::builder::{CompiledShader, ShaderBuilder};
use super::chunk::Chunk;
use super::config::ShaderConfig;
use super::library::ChunkLibrary;
use super::settings::CompilerSettings;
use super::structs::{StructDefinition, StructRegistry};
use crate::errors::Result;

pub struct CompilerContext {
    library: RwLock<ChunkLibrary>,
    structs: RwLock<StructRegistry>,
    settings: CompilerSettings,
    /// xxh3-128 of the configuration → compiled result.
    cache: Mutex<FxHashMap<u128, Arc<CompiledShader>>>,
}

impl Default for CompilerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerContext {
    /// An empty context: no chunks, no structs, default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(ChunkLibrary::new(), StructRegistry::new(), CompilerSettings::default())
    }

    /// A context preloaded with the built-in chunks and uniform structs.
    #[must_use]
    pub fn with_builtin() -> Self {
        Self::with_settings(CompilerSettings::default())
    }

    /// Like [`with_builtin`](Self::with_builtin), with custom settings.
    #[must_use]
    pub fn with_settings(settings: CompilerSettings) -> Self {
        Self::from_parts(ChunkLibrary::with_builtin(), StructRegistry::with_builtin(), settings)
    }

    #[must_use]
    pub fn from_parts(
        library: ChunkLibrary,
        structs: StructRegistry,
        settings: CompilerSettings,
    ) -> Self {
        Self {
            library: RwLock::new(library),
            structs: RwLock::new(structs),
            settings,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    // === Registration ===

    /// Registers `chunk`, replacing any chunk of the same name.
    ///
    /// Cached results are not invalidated; call
    /// [`clear_cache`](Self::clear_cache) after replacing a chunk that
    /// existing configurations use.
    pub fn register_chunk(&self, chunk: Chunk) -> Option<Arc<Chunk>> {
        self.library.write().add(chunk)
    }

    /// Parses and registers a chunk from source.
    pub fn register_chunk_source(&self, name: &str, template: &str) -> Option<Arc<Chunk>> {
        self.register_chunk(Chunk::new(name, template))
    }

    pub fn register_struct(&self, definition: StructDefinition) -> Option<StructDefinition> {
        self.structs.write().add(definition)
    }

    #[must_use]
    pub fn library(&self) -> RwLockReadGuard<'_, ChunkLibrary> {
        self.library.read()
    }

    pub fn library_mut(&self) -> RwLockWriteGuard<'_, ChunkLibrary> {
        self.library.write()
    }

    #[must_use]
    pub fn structs(&self) -> RwLockReadGuard<'_, StructRegistry> {
        self.structs.read()
    }

    // === Building ===

    /// Returns the cached result for `config`, building it on a miss.
    pub fn get_or_build(&self, config: &ShaderConfig) -> Result<Arc<CompiledShader>> {
        let hash = config.config_hash()?;

        if let Some(compiled) = self.cache.lock().get(&hash) {
            log::debug!("Shader cache hit: '{}' ({hash:032x})", config.name);
            return Ok(Arc::clone(compiled));
        }

        log::debug!("Shader cache miss: '{}' ({hash:032x}), building", config.name);
        let compiled = {
            let library = self.library.read();
            let structs = self.structs.read();
            ShaderBuilder {
                library: &library,
                structs: &structs,
                settings: &self.settings,
            }
            .build(config, hash)?
        };

        let mut cache = self.cache.lock();
        let entry = cache.entry(hash).or_insert_with(|| Arc::new(compiled));
        Ok(Arc::clone(entry))
    }

    /// Cached result for a configuration hash, if any.
    #[must_use]
    pub fn cached(&self, hash: u128) -> Option<Arc<CompiledShader>> {
        self.cache.lock().get(&hash).cloned()
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}

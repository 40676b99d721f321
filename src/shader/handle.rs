//! Material-facing shader handle.

use std::sync::Arc;

use super::bindings::BindingSet;
use super::builder::CompiledShader;
use super::config::ShaderConfig;
use super::context::CompilerContext;
use super::defines::{FeatureFlags, FlagValue};
use crate::errors::Result;

/// A configuration together with its compiled programs.
///
/// Flag updates rebuild both stages through the context; switching back to a
/// previously built flag set is a cache hit.
#[derive(Debug, Clone)]
pub struct Shader {
    config: ShaderConfig,
    compiled: Arc<CompiledShader>,
}

impl Shader {
    pub fn new(ctx: &CompilerContext, config: ShaderConfig) -> Result<Self> {
        let compiled = ctx.get_or_build(&config)?;
        Ok(Self { config, compiled })
    }

    /// Sets one flag and rebuilds.
    ///
    /// On failure the shader keeps its previous configuration and programs.
    pub fn set_flag(
        &mut self,
        ctx: &CompilerContext,
        key: &str,
        value: impl Into<FlagValue>,
    ) -> Result<()> {
        let mut config = self.config.clone();
        config.flags.set(key, value);
        self.rebuild(ctx, config)
    }

    /// Merges `flags` into the current set and rebuilds.
    pub fn set_flags(&mut self, ctx: &CompilerContext, flags: &FeatureFlags) -> Result<()> {
        let mut config = self.config.clone();
        config.flags.merge(flags);
        self.rebuild(ctx, config)
    }

    fn rebuild(&mut self, ctx: &CompilerContext, config: ShaderConfig) -> Result<()> {
        self.compiled = ctx.get_or_build(&config)?;
        self.config = config;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ShaderConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> &FeatureFlags {
        &self.config.flags
    }

    #[inline]
    #[must_use]
    pub fn compiled(&self) -> &Arc<CompiledShader> {
        &self.compiled
    }

    #[inline]
    #[must_use]
    pub fn vertex_source(&self) -> &str {
        self.compiled.vertex_source()
    }

    #[inline]
    #[must_use]
    pub fn fragment_source(&self) -> &str {
        self.compiled.fragment_source()
    }

    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &BindingSet {
        self.compiled.bindings()
    }

    #[inline]
    #[must_use]
    pub fn hash(&self) -> u128 {
        self.compiled.hash()
    }
}

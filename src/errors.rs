//! Error Types
//!
//! This module defines the error types used throughout the shader composer.
//!
//! # Overview
//!
//! The main error type [`ForgeError`] covers all failure modes including:
//! - Chunk resolution failures (strict mode only)
//! - Stage wrapper template rendering errors
//! - Post-build verification and WGSL validation failures
//!
//! Degraded authoring input (unterminated stage blocks, unknown chunk names,
//! duplicate bindings) is tolerated by default and only logged; see
//! [`CompilerSettings::strict`](crate::shader::CompilerSettings::strict).
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, ForgeError>`.
//!
//! ```rust,ignore
//! use wgsl_forge::errors::{ForgeError, Result};
//!
//! fn compile() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::shader::Stage;

/// The main error type for shader composition.
#[derive(Error, Debug)]
pub enum ForgeError {
    // ========================================================================
    // Chunk Errors
    // ========================================================================
    /// An `#include` (or configured chunk) names a chunk that is not registered.
    #[error("Unresolved chunk '{name}' in shader '{shader}'")]
    UnresolvedChunk {
        /// Shader being built
        shader: String,
        /// Name that failed to resolve
        name: String,
    },

    /// An included chunk carried parse diagnostics.
    #[error("Malformed chunk '{name}': {detail}")]
    MalformedChunk {
        /// Chunk name
        name: String,
        /// First diagnostic, rendered
        detail: String,
    },

    // ========================================================================
    // Generation Errors
    // ========================================================================
    /// Stage wrapper template failed to render.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Configuration could not be serialized for hashing.
    #[error("JSON serialize error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Verification Errors
    // ========================================================================
    /// Generated source still contains template-substitution artifacts.
    #[error("Verification failed for {stage} stage of '{shader}': {reason}")]
    Verification {
        /// Shader being built
        shader: String,
        /// Offending stage
        stage: Stage,
        /// What was found
        reason: String,
        /// The generated text
        text: String,
    },

    /// Generated source is not valid WGSL.
    #[cfg(feature = "naga")]
    #[error("WGSL validation failed for {stage} stage of '{shader}': {message}")]
    Validation {
        /// Shader being built
        shader: String,
        /// Offending stage
        stage: Stage,
        /// Parser diagnostics
        message: String,
        /// The generated text
        text: String,
    },
}

impl ForgeError {
    /// Stage the error is attached to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Verification { stage, .. } => Some(*stage),
            #[cfg(feature = "naga")]
            Self::Validation { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Generated text the error refers to, if any.
    #[must_use]
    pub fn generated_source(&self) -> Option<&str> {
        match self {
            Self::Verification { text, .. } => Some(text),
            #[cfg(feature = "naga")]
            Self::Validation { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Alias for `Result<T, ForgeError>`.
pub type Result<T> = std::result::Result<T, ForgeError>;

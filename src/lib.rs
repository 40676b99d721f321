#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # wgsl-forge
//!
//! Chunk-based WGSL template composition: a library of small shader
//! fragments plus a per-material configuration produce a finished vertex
//! program, a finished fragment program and the binding metadata needed to
//! lay out their bind groups.
//!
//! See [`shader`] for the template grammar and the build pipeline.

pub mod errors;
pub mod shader;
pub mod utils;

pub use errors::{ForgeError, Result};
pub use shader::{
    BindingDescriptor, BindingSet, Chunk, ChunkLibrary, CompiledShader, CompilerContext,
    CompilerSettings, FeatureFlags, FlagValue, Shader, ShaderConfig, Stage, StructDefinition,
};
pub use utils::interner;

//! Shader Composition
//!
//! Builds WGSL vertex and fragment programs from small reusable chunks.
//!
//! # Pipeline
//!
//! ```text
//! ShaderConfig ──► CompilerContext::get_or_build ──► Arc<CompiledShader>
//!                        │
//!                        ├─ stage wrapper (minijinja): Input/Output structs + entry template
//!                        ├─ TemplateProcessor (per stage)
//!                        │    #if → chunk insertion → #include → entry signature
//!                        │    → #if → #struct → ${KEY} → bindings
//!                        ├─ format_source
//!                        └─ verification
//! ```
//!
//! # Chunk grammar
//!
//! | Construct         | Form                                             |
//! |-------------------|--------------------------------------------------|
//! | Stage block       | `@fragment(before:color_end) {{ ... }}`          |
//! | Inclusion         | `#include <name>`                                |
//! | Conditional       | `#if FLAG { ... } else { ... }`                  |
//! | Entry marker      | `@vertex(input) -> output {`                     |
//! | Struct macro      | `#struct(CameraUniforms)`                        |
//! | Variable          | `${FLAG}`                                        |
//!
//! # Example
//!
//! ```rust,ignore
//! use wgsl_forge::shader::{CompilerContext, Shader, ShaderConfig};
//!
//! let ctx = CompilerContext::with_builtin();
//! let config = ShaderConfig::new("unlit")
//!     .attribute("position", "vec3<f32>")
//!     .chunks(["transform", "color_begin", "fog", "color_end"])
//!     .flag("USE_FOG", true);
//!
//! let shader = Shader::new(&ctx, config)?;
//! println!("{}", shader.fragment_source());
//! ```

pub(crate) mod assets;
pub mod bindings;
pub mod builder;
pub mod chunk;
pub mod conditional;
pub mod config;
pub mod context;
pub mod defines;
pub mod formatter;
pub mod handle;
pub mod library;
pub mod ordering;
pub mod processor;
pub(crate) mod scan;
pub mod settings;
pub mod stage;
pub mod structs;

pub use bindings::{BindingDescriptor, BindingSet, extract_bindings};
pub use builder::CompiledShader;
pub use chunk::{Chunk, ChunkDiagnostic, OrderRule};
pub use conditional::expand_conditionals;
pub use config::{Attribute, ChunkRef, Output, ShaderConfig, Varying};
pub use context::CompilerContext;
pub use defines::{FeatureFlags, FlagValue};
pub use formatter::format_source;
pub use handle::Shader;
pub use library::ChunkLibrary;
pub use ordering::sort_chunks;
pub use processor::TemplateProcessor;
pub use settings::CompilerSettings;
pub use stage::{Stage, StageSet};
pub use structs::{StructDefinition, StructField, StructRegistry, WgslType};

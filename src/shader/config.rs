//! Shader Configuration
//!
//! Everything a material supplies to build one shader: vertex attributes,
//! inter-stage varyings, fragment outputs, the chunk list, feature flags and
//! optional custom entry templates.
//!
//! The configuration is hashed as a whole. Serialization is stable: fields
//! are emitted in declaration order and feature flags in key order, so two
//! configurations built in different orders hash the same as long as their
//! flag sets are equal.
//!
//! ```rust,ignore
//! let config = ShaderConfig::new("basic")
//!     .attribute("position", "vec3<f32>")
//!     .varying("uv", "vec2<f32>")
//!     .chunk("transform")
//!     .chunk("color_begin")
//!     .chunk("color_end")
//!     .flag("USE_UV", true);
//! ```

use std::sync::Arc;

use serde::{Serialize, Serializer};
use xxhash_rust::xxh3::xxh3_128;

use super::chunk::Chunk;
use super::defines::{FeatureFlags, FlagValue};
use super::stage::Stage;
use crate::errors::Result;

/// A vertex buffer attribute. `location` defaults to the attribute's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub ty: String,
    pub location: Option<u32>,
}

/// A value passed from the vertex to the fragment stage.
///
/// Varyings are assigned locations by index on both sides of the interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Varying {
    pub name: String,
    pub ty: String,
    /// `@interpolate(...)` argument, e.g. `flat` or `perspective, centroid`.
    pub interpolation: Option<String>,
}

/// A fragment stage output. `location` defaults to the output's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub location: Option<u32>,
    pub name: String,
    pub ty: String,
}

/// A chunk requested by a configuration.
#[derive(Debug, Clone)]
pub enum ChunkRef {
    /// A chunk registered in the context's library.
    Named(String),
    /// A chunk carried by the configuration itself; shadows library entries
    /// of the same name.
    Inline(Arc<Chunk>),
}

impl ChunkRef {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Inline(chunk) => chunk.name(),
        }
    }
}

impl Serialize for ChunkRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Named(name) => serializer.serialize_str(name),
            Self::Inline(chunk) => chunk.as_ref().serialize(serializer),
        }
    }
}

impl From<&str> for ChunkRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for ChunkRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Chunk> for ChunkRef {
    fn from(chunk: Chunk) -> Self {
        Self::Inline(Arc::new(chunk))
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ShaderConfig {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub varyings: Vec<Varying>,
    pub outputs: Vec<Output>,
    pub chunks: Vec<ChunkRef>,
    pub flags: FeatureFlags,
    /// Replaces the embedded default vertex entry template.
    pub vertex_template: Option<String>,
    /// Replaces the embedded default fragment entry template.
    pub fragment_template: Option<String>,
}

impl ShaderConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    // === Builder ===

    #[must_use]
    pub fn attribute(mut self, name: &str, ty: &str) -> Self {
        self.attributes.push(Attribute {
            name: name.to_owned(),
            ty: ty.to_owned(),
            location: None,
        });
        self
    }

    #[must_use]
    pub fn attribute_at(mut self, location: u32, name: &str, ty: &str) -> Self {
        self.attributes.push(Attribute {
            name: name.to_owned(),
            ty: ty.to_owned(),
            location: Some(location),
        });
        self
    }

    #[must_use]
    pub fn varying(mut self, name: &str, ty: &str) -> Self {
        self.varyings.push(Varying {
            name: name.to_owned(),
            ty: ty.to_owned(),
            interpolation: None,
        });
        self
    }

    #[must_use]
    pub fn varying_interpolated(mut self, name: &str, ty: &str, interpolation: &str) -> Self {
        self.varyings.push(Varying {
            name: name.to_owned(),
            ty: ty.to_owned(),
            interpolation: Some(interpolation.to_owned()),
        });
        self
    }

    #[must_use]
    pub fn output(mut self, name: &str, ty: &str) -> Self {
        self.outputs.push(Output {
            location: None,
            name: name.to_owned(),
            ty: ty.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn output_at(mut self, location: u32, name: &str, ty: &str) -> Self {
        self.outputs.push(Output {
            location: Some(location),
            name: name.to_owned(),
            ty: ty.to_owned(),
        });
        self
    }

    /// Appends a chunk by name, or an inline [`Chunk`].
    #[must_use]
    pub fn chunk(mut self, chunk: impl Into<ChunkRef>) -> Self {
        self.chunks.push(chunk.into());
        self
    }

    #[must_use]
    pub fn chunks<I>(mut self, chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ChunkRef>,
    {
        self.chunks.extend(chunks.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn flag(mut self, key: &str, value: impl Into<FlagValue>) -> Self {
        self.flags.set(key, value);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: &FeatureFlags) -> Self {
        self.flags.merge(flags);
        self
    }

    #[must_use]
    pub fn vertex_template(mut self, template: impl Into<String>) -> Self {
        self.vertex_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn fragment_template(mut self, template: impl Into<String>) -> Self {
        self.fragment_template = Some(template.into());
        self
    }

    // === Queries ===

    /// Custom entry template for `stage`, if one was supplied.
    #[must_use]
    pub fn entry_template(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Vertex => self.vertex_template.as_deref(),
            Stage::Fragment => self.fragment_template.as_deref(),
            Stage::Compute => None,
        }
    }

    /// Chunk names in list order, named and inline alike.
    #[must_use]
    pub fn chunk_names(&self) -> Vec<&str> {
        self.chunks.iter().map(ChunkRef::name).collect()
    }

    #[must_use]
    pub fn inline_chunks(&self) -> Vec<Arc<Chunk>> {
        self.chunks
            .iter()
            .filter_map(|c| match c {
                ChunkRef::Inline(chunk) => Some(Arc::clone(chunk)),
                ChunkRef::Named(_) => None,
            })
            .collect()
    }

    /// xxh3-128 over the JSON serialization of the whole configuration.
    pub fn config_hash(&self) -> Result<u128> {
        let json = serde_json::to_vec(self)?;
        Ok(xxh3_128(&json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_ignores_flag_insertion_order() {
        let a = ShaderConfig::new("s").flag("A", true).flag("B", 2);
        let b = ShaderConfig::new("s").flag("B", 2).flag("A", true);
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
    }

    #[test]
    fn test_hash_covers_every_field() {
        let base = ShaderConfig::new("s").attribute("position", "vec3<f32>").chunk("fog");
        let h = base.config_hash().unwrap();

        assert_ne!(h, base.clone().flag("USE_FOG", true).config_hash().unwrap());
        assert_ne!(h, base.clone().chunk("gamma").config_hash().unwrap());
        assert_ne!(h, base.clone().varying("uv", "vec2<f32>").config_hash().unwrap());
        assert_ne!(h, base.clone().fragment_template("x").config_hash().unwrap());
        assert_ne!(
            h,
            ShaderConfig::new("s")
                .attribute_at(3, "position", "vec3<f32>")
                .chunk("fog")
                .config_hash()
                .unwrap()
        );
    }

    #[test]
    fn test_inline_chunk_serializes_its_template() {
        let a = ShaderConfig::new("s").chunk(Chunk::new("tint", "@fragment {{ a(); }}"));
        let b = ShaderConfig::new("s").chunk(Chunk::new("tint", "@fragment {{ b(); }}"));
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
        assert_eq!(a.chunk_names(), vec!["tint"]);
        assert_eq!(a.inline_chunks().len(), 1);
    }
}

//! Struct Definitions
//!
//! Named field lists expanded by `#struct(Name)` macros. Field types are WGSL
//! type strings; [`WgslType`] derives them from the Rust-side math types so a
//! uniform struct can be declared from the types that fill it.
//!
//! ```rust,ignore
//! use glam::{Mat4, Vec3};
//!
//! let camera = StructDefinition::new("CameraUniforms")
//!     .field::<Mat4>("view_projection")
//!     .field::<Vec3>("position")
//!     .field::<f32>("time");
//! ```

use rustc_hash::FxHashMap;

use crate::utils::interner::{self, Symbol};

/// Rust types with a fixed WGSL spelling.
pub trait WgslType {
    const WGSL: &'static str;
}

macro_rules! impl_wgsl_type {
    ($($ty:ty => $wgsl:literal),* $(,)?) => {
        $(impl WgslType for $ty {
            const WGSL: &'static str = $wgsl;
        })*
    };
}

impl_wgsl_type! {
    f32 => "f32",
    u32 => "u32",
    i32 => "i32",
    bool => "bool",
    glam::Vec2 => "vec2<f32>",
    glam::Vec3 => "vec3<f32>",
    glam::Vec4 => "vec4<f32>",
    glam::UVec2 => "vec2<u32>",
    glam::UVec3 => "vec3<u32>",
    glam::UVec4 => "vec4<u32>",
    glam::IVec2 => "vec2<i32>",
    glam::IVec3 => "vec3<i32>",
    glam::IVec4 => "vec4<i32>",
    glam::Mat2 => "mat2x2<f32>",
    glam::Mat3 => "mat3x3<f32>",
    glam::Mat4 => "mat4x4<f32>",
    glam::Quat => "vec4<f32>",
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructDefinition {
    name: String,
    fields: Vec<StructField>,
}

impl StructDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field typed by a Rust type.
    #[must_use]
    pub fn field<T: WgslType>(self, name: &str) -> Self {
        self.field_raw(name, T::WGSL)
    }

    /// Appends a field with a literal WGSL type.
    #[must_use]
    pub fn field_raw(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(StructField {
            name: name.to_owned(),
            ty: ty.to_owned(),
        });
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// The `name: type,` field list substituted for `#struct(Name)`.
    #[must_use]
    pub fn field_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}: {},", f.name, f.ty))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A full `struct Name { ... }` declaration.
    #[must_use]
    pub fn declaration(&self) -> String {
        let mut out = format!("struct {} {{\n", self.name);
        for f in &self.fields {
            out.push_str(&format!("    {}: {},\n", f.name, f.ty));
        }
        out.push('}');
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct StructRegistry {
    structs: FxHashMap<Symbol, StructDefinition>,
}

impl StructRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the uniform structs used by the built-in chunks.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.add(
            StructDefinition::new("CameraUniforms")
                .field::<glam::Mat4>("view_projection")
                .field::<glam::Mat4>("view")
                .field::<glam::Vec3>("position")
                .field::<f32>("time"),
        );
        registry.add(
            StructDefinition::new("ModelUniforms")
                .field::<glam::Mat4>("world")
                .field::<glam::Mat4>("normal_matrix"),
        );
        registry
    }

    /// Registers a definition; last write wins.
    pub fn add(&mut self, definition: StructDefinition) -> Option<StructDefinition> {
        self.structs
            .insert(interner::intern(definition.name()), definition)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StructDefinition> {
        interner::get(name).and_then(|sym| self.structs.get(&sym))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.structs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_list() {
        let def = StructDefinition::new("Light")
            .field::<glam::Vec3>("color")
            .field::<f32>("intensity")
            .field_raw("kind", "u32");

        assert_eq!(
            def.field_list(),
            "color: vec3<f32>,\nintensity: f32,\nkind: u32,"
        );
        assert!(def.declaration().starts_with("struct Light {\n    color: vec3<f32>,"));
    }

    #[test]
    fn test_registry() {
        let registry = StructRegistry::with_builtin();
        assert!(registry.get("CameraUniforms").is_some());
        assert_eq!(registry.get("ModelUniforms").unwrap().fields().len(), 2);
        assert!(registry.get("NotAStruct").is_none());
    }
}

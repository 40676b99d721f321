//! Binding Extraction
//!
//! Scans fully expanded WGSL for resource declarations of the shape
//!
//! ```text
//! @group(G) @binding(B) var<kind[, access]> name: type;
//! @group(G) @binding(B) var name: texture_or_sampler_type;
//! ```
//!
//! and records them as [`BindingDescriptor`]s. Slots are unique on
//! `(group, binding)`: the first declaration wins, later ones only widen the
//! descriptor's stage visibility.
//!
//! Declarations without an address space (textures, samplers) are recorded
//! with the storage kind [`HANDLE_KIND`].

use std::num::NonZeroU32;

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::scan;
use super::stage::{Stage, StageSet};

/// Storage kind recorded for texture and sampler declarations.
pub const HANDLE_KIND: &str = "handle";

/// One resource slot referenced by a compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BindingDescriptor {
    pub group: u32,
    pub binding: u32,
    /// Address space (`uniform`, `storage`, ...) or [`HANDLE_KIND`].
    pub storage_kind: String,
    pub access: Option<String>,
    pub name: String,
    pub ty: String,
    /// Stages in which the slot was declared.
    #[serde(skip)]
    pub visibility: StageSet,
}

impl BindingDescriptor {
    #[inline]
    #[must_use]
    pub fn slot(&self) -> (u32, u32) {
        (self.group, self.binding)
    }

    /// Binding type for a bind group layout, if the declaration maps to one.
    ///
    /// `private` / `workgroup` variables and storage textures have no layout
    /// representation here and return `None`.
    #[must_use]
    pub fn binding_type(&self) -> Option<wgpu::BindingType> {
        match self.storage_kind.as_str() {
            "uniform" => Some(buffer(wgpu::BufferBindingType::Uniform)),
            "storage" => Some(buffer(wgpu::BufferBindingType::Storage {
                read_only: self.access.as_deref().is_none_or(|a| a == "read"),
            })),
            HANDLE_KIND => handle_binding_type(&self.ty),
            _ => None,
        }
    }

    /// Layout entry for the bind-group-layout builder.
    #[must_use]
    pub fn to_layout_entry(&self) -> Option<wgpu::BindGroupLayoutEntry> {
        Some(wgpu::BindGroupLayoutEntry {
            binding: self.binding,
            visibility: self.visibility.to_wgpu(),
            ty: self.binding_type()?,
            count: None::<NonZeroU32>,
        })
    }
}

fn buffer(ty: wgpu::BufferBindingType) -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

fn handle_binding_type(ty: &str) -> Option<wgpu::BindingType> {
    let ty = ty.replace(' ', "");
    match ty.as_str() {
        "sampler" => return Some(wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)),
        "sampler_comparison" => {
            return Some(wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison));
        }
        _ => {}
    }

    let (base, sample_type) = if let Some(base) = ty.strip_prefix("texture_depth_") {
        (base, wgpu::TextureSampleType::Depth)
    } else {
        let base = ty.strip_prefix("texture_")?;
        let (base, scalar) = base.split_once('<')?;
        let sample_type = match scalar.strip_suffix('>')? {
            "f32" => wgpu::TextureSampleType::Float { filterable: true },
            "i32" => wgpu::TextureSampleType::Sint,
            "u32" => wgpu::TextureSampleType::Uint,
            _ => return None,
        };
        (base, sample_type)
    };

    let (base, multisampled) = match base.strip_prefix("multisampled_") {
        Some(base) => (base, true),
        None => (base, false),
    };
    let view_dimension = match base {
        "1d" => wgpu::TextureViewDimension::D1,
        "2d" => wgpu::TextureViewDimension::D2,
        "2d_array" => wgpu::TextureViewDimension::D2Array,
        "3d" => wgpu::TextureViewDimension::D3,
        "cube" => wgpu::TextureViewDimension::Cube,
        "cube_array" => wgpu::TextureViewDimension::CubeArray,
        _ => return None,
    };

    Some(wgpu::BindingType::Texture {
        sample_type,
        view_dimension,
        multisampled,
    })
}

/// Ordered, `(group, binding)`-unique list of descriptors.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    entries: Vec<BindingDescriptor>,
    slots: FxHashMap<(u32, u32), usize>,
}

impl BindingSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `descriptor` unless its slot is taken.
    ///
    /// Returns `true` if it was added. A rejected duplicate still marks the
    /// existing slot as visible in the duplicate's stages.
    pub fn insert(&mut self, descriptor: BindingDescriptor) -> bool {
        if let Some(&idx) = self.slots.get(&descriptor.slot()) {
            let existing = &mut self.entries[idx];
            if existing.name != descriptor.name || existing.ty != descriptor.ty {
                log::debug!(
                    "Binding ({}, {}) '{}' shadows later declaration '{}'",
                    existing.group,
                    existing.binding,
                    existing.name,
                    descriptor.name
                );
            }
            existing.visibility |= descriptor.visibility;
            return false;
        }
        self.slots.insert(descriptor.slot(), self.entries.len());
        self.entries.push(descriptor);
        true
    }

    #[must_use]
    pub fn get(&self, group: u32, binding: u32) -> Option<&BindingDescriptor> {
        self.slots.get(&(group, binding)).map(|&idx| &self.entries[idx])
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BindingDescriptor> {
        self.entries.iter()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[BindingDescriptor] {
        &self.entries
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<BindingDescriptor> {
        self.entries
    }

    /// Layout entries of one bind group, sorted by binding index.
    #[must_use]
    pub fn layout_entries(&self, group: u32) -> Vec<wgpu::BindGroupLayoutEntry> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|d| d.group == group)
            .filter_map(BindingDescriptor::to_layout_entry)
            .collect();
        entries.sort_by_key(|e| e.binding);
        entries
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = &'a BindingDescriptor;
    type IntoIter = std::slice::Iter<'a, BindingDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Appends every binding declared in `src` to `out`.
pub fn extract_bindings(src: &str, stage: Option<Stage>, out: &mut BindingSet) {
    let bytes = src.as_bytes();
    let visibility = stage.map_or(StageSet::empty(), StageSet::from);
    let mut i = 0;

    while i < bytes.len() {
        if let Some(next) = scan::skip_comment(src, i) {
            i = next;
            continue;
        }
        if bytes[i] == b'@'
            && let Some((mut descriptor, end)) = parse_declaration(src, i)
        {
            descriptor.visibility = visibility;
            out.insert(descriptor);
            i = end;
            continue;
        }
        i += 1;
    }
}

fn parse_attribute(src: &str, i: usize, name: &str) -> Option<(u32, usize)> {
    let i = scan::skip_ws(src, i);
    let rest = src.get(i..)?.strip_prefix('@')?.strip_prefix(name)?;
    let open = scan::skip_ws(src, src.len() - rest.len());
    let (inner, end) = scan::read_parens(src, open)?;
    Some((inner.parse().ok()?, end))
}

fn parse_declaration(src: &str, at: usize) -> Option<(BindingDescriptor, usize)> {
    let (group, i) = parse_attribute(src, at, "group")?;
    let (binding, i) = parse_attribute(src, i, "binding")?;

    let i = scan::skip_ws(src, i);
    let (keyword, i) = scan::read_ident(src, i)?;
    if keyword != "var" {
        return None;
    }

    let i = scan::skip_ws(src, i);
    let (storage_kind, access, i) = if src.as_bytes().get(i) == Some(&b'<') {
        let close = i + src[i..].find('>')?;
        let mut parts = src[i + 1..close].split(',').map(str::trim);
        let kind = parts.next().filter(|k| !k.is_empty())?.to_owned();
        let access = parts.next().filter(|a| !a.is_empty()).map(str::to_owned);
        (kind, access, scan::skip_ws(src, close + 1))
    } else {
        (HANDLE_KIND.to_owned(), None, i)
    };

    let (name, i) = scan::read_ident(src, i)?;
    let i = scan::skip_ws(src, i);
    if src.as_bytes().get(i) != Some(&b':') {
        return None;
    }
    let semi = i + src[i..].find(';')?;
    let ty = src[i + 1..semi].trim();
    if ty.is_empty() {
        return None;
    }

    Some((
        BindingDescriptor {
            group,
            binding,
            storage_kind,
            access,
            name: name.to_owned(),
            ty: ty.to_owned(),
            visibility: StageSet::empty(),
        },
        semi + 1,
    ))
}

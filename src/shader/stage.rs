//! Shader stages and stage sets.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One program entry point being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Vertex,
    Fragment,
    Compute,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Vertex, Stage::Fragment, Stage::Compute];

    /// Lowercase name as it appears in `@vertex` markers and `{{vertex}}` placeholders.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }

    /// Capitalized name used to form `<Stage>Input` / `<Stage>Output`.
    #[inline]
    #[must_use]
    pub const fn type_prefix(self) -> &'static str {
        match self {
            Self::Vertex => "Vertex",
            Self::Fragment => "Fragment",
            Self::Compute => "Compute",
        }
    }

    /// Entry-point function name emitted by signature expansion.
    #[inline]
    #[must_use]
    pub const fn entry_point(self) -> &'static str {
        match self {
            Self::Vertex => "vs_main",
            Self::Fragment => "fs_main",
            Self::Compute => "cs_main",
        }
    }

    /// Body placeholder token substituted with the sorted chunk code.
    #[must_use]
    pub fn placeholder(self) -> String {
        format!("{{{{{}}}}}", self.name())
    }

    #[must_use]
    pub fn input_type(self) -> String {
        format!("{}Input", self.type_prefix())
    }

    #[must_use]
    pub fn output_type(self) -> String {
        format!("{}Output", self.type_prefix())
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(Self::Vertex),
            "fragment" => Some(Self::Fragment),
            "compute" => Some(Self::Compute),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of stages, e.g. the stages a chunk contributes code to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StageSet: u8 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE = 1 << 2;
    }
}

impl From<Stage> for StageSet {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Vertex => StageSet::VERTEX,
            Stage::Fragment => StageSet::FRAGMENT,
            Stage::Compute => StageSet::COMPUTE,
        }
    }
}

impl StageSet {
    #[inline]
    #[must_use]
    pub fn has(self, stage: Stage) -> bool {
        self.contains(stage.into())
    }

    /// Iterates the contained stages in vertex → fragment → compute order.
    pub fn stages(self) -> impl Iterator<Item = Stage> {
        Stage::ALL.into_iter().filter(move |s| self.has(*s))
    }

    /// Visibility flags for a bind group layout entry.
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::ShaderStages {
        let mut out = wgpu::ShaderStages::NONE;
        if self.contains(Self::VERTEX) {
            out |= wgpu::ShaderStages::VERTEX;
        }
        if self.contains(Self::FRAGMENT) {
            out |= wgpu::ShaderStages::FRAGMENT;
        }
        if self.contains(Self::COMPUTE) {
            out |= wgpu::ShaderStages::COMPUTE;
        }
        out
    }
}

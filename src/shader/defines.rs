//! Feature Flags
//!
//! The flag map consulted by `#if NAME { ... }` conditionals and `${NAME}`
//! substitutions.
//!
//! # Architecture
//!
//! Keys are interned [`Symbol`]s kept in a sorted `Vec`, giving:
//!
//! - **Fast comparison**: identical flag sets compare element-wise on integers
//! - **Consistent hashing**: same flag sets always produce same hashes
//! - **Stable serialization**: serialized as a map ordered by key text, so the
//!   configuration hash does not depend on insertion order
//!
//! # Usage
//!
//! ```rust,ignore
//! use wgsl_forge::shader::FeatureFlags;
//!
//! let mut flags = FeatureFlags::new();
//! flags.set("USE_FOG", true);
//! flags.set("MAX_LIGHTS", 8);
//!
//! assert!(flags.is_enabled("USE_FOG"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::utils::interner::{self, Symbol};

/// Value of a single feature flag.
///
/// Only [`FlagValue::Bool`]`(true)` enables an `#if` block; every variant can
/// be substituted into `${NAME}` tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FlagValue {
    #[inline]
    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            // Debug keeps the decimal point, so 1.0 stays a WGSL float literal.
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl PartialEq for FlagValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FlagValue {}

impl Hash for FlagValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FlagValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for FlagValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for FlagValue {
    fn from(v: u32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f32> for FlagValue {
    fn from(v: f32) -> Self {
        Self::Float(v.into())
    }
}

impl From<f64> for FlagValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FlagValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FlagValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A collection of feature flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, FlagValue>", from = "BTreeMap<String, FlagValue>")]
pub struct FeatureFlags {
    flags: Vec<(Symbol, FlagValue)>,
}

impl FeatureFlags {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { flags: Vec::new() }
    }

    /// Sets a flag, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<FlagValue>) {
        self.set_symbol(interner::intern(key), value.into());
    }

    #[inline]
    pub fn set_symbol(&mut self, key: Symbol, value: FlagValue) {
        match self.flags.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(idx) => self.flags[idx].1 = value,
            Err(idx) => self.flags.insert(idx, (key, value)),
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<FlagValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<FlagValue> {
        let sym = interner::get(key)?;
        let idx = self.flags.binary_search_by_key(&sym, |(k, _)| *k).ok()?;
        Some(self.flags.remove(idx).1)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FlagValue> {
        interner::get(key).and_then(|sym| self.get_symbol(sym))
    }

    #[inline]
    #[must_use]
    pub fn get_symbol(&self, key: Symbol) -> Option<&FlagValue> {
        self.flags
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|idx| &self.flags[idx].1)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether `key` is set to boolean `true`.
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).is_some_and(FlagValue::is_true)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Iterates flags as `(name, value)` in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FlagValue)> + '_ {
        self.flags.iter().map(|(k, v)| (interner::resolve(*k), v))
    }

    /// Merges `other` into `self`; values from `other` win.
    pub fn merge(&mut self, other: &FeatureFlags) {
        for (key, value) in &other.flags {
            self.set_symbol(*key, value.clone());
        }
    }

    /// In-process content hash.
    #[must_use]
    pub fn compute_hash(&self) -> u64 {
        use std::hash::BuildHasher;

        rustc_hash::FxBuildHasher.hash_one(self)
    }
}

impl Hash for FeatureFlags {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.flags.hash(state);
    }
}

impl PartialEq for FeatureFlags {
    fn eq(&self, other: &Self) -> bool {
        self.flags == other.flags
    }
}

impl Eq for FeatureFlags {}

impl From<FeatureFlags> for BTreeMap<String, FlagValue> {
    fn from(flags: FeatureFlags) -> Self {
        flags
            .flags
            .into_iter()
            .map(|(k, v)| (interner::resolve(k).to_owned(), v))
            .collect()
    }
}

impl From<BTreeMap<String, FlagValue>> for FeatureFlags {
    fn from(map: BTreeMap<String, FlagValue>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: AsRef<str>, V: Into<FlagValue>> FromIterator<(K, V)> for FeatureFlags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut flags = Self::new();
        for (k, v) in iter {
            flags.set(k.as_ref(), v);
        }
        flags
    }
}

//! Utility Module
//!
//! - [`interner`]: String interning for chunk names and feature-flag keys
//!
//! ```rust,ignore
//! use wgsl_forge::utils::interner;
//!
//! let sym1 = interner::intern("USE_FOG");
//! let sym2 = interner::intern("USE_FOG");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod interner;

pub use interner::Symbol;

//! Compiler Settings
//!
//! Knobs consumed by [`CompilerContext`](super::CompilerContext) for every
//! build. Settings are fixed for the lifetime of a context; build a new
//! context to change them.
//!
//! ```rust,ignore
//! use wgsl_forge::shader::{CompilerContext, CompilerSettings};
//!
//! let ctx = CompilerContext::with_settings(CompilerSettings {
//!     strict: true,
//!     ..Default::default()
//! });
//! ```

use serde::{Deserialize, Serialize};

/// Build-time options for shader composition.
///
/// # Fields
///
/// | Field           | Description                                         | Default |
/// |-----------------|-----------------------------------------------------|---------|
/// | `strict`        | Unknown or malformed chunks fail the build          | `false` |
/// | `validate`      | Parse the output as WGSL (requires `naga` feature)  | `false` |
/// | `format_output` | Re-indent the generated source                      | `true`  |
/// | `indent_width`  | Spaces per brace level when formatting              | `4`     |
/// | `debug_print`   | Log every generated stage at `debug` level          | `false` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Treat an unresolved chunk name, or an included chunk that produced
    /// parse diagnostics, as a build error instead of a warning.
    pub strict: bool,

    /// Run the WGSL front end over each generated stage.
    ///
    /// Ignored unless the crate is built with the `naga` feature.
    pub validate: bool,

    pub format_output: bool,

    pub indent_width: usize,

    pub debug_print: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            strict: false,
            validate: false,
            format_output: true,
            indent_width: 4,
            debug_print: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: CompilerSettings = serde_json::from_str(r#"{ "strict": true }"#).unwrap();
        assert!(settings.strict);
        assert!(settings.format_output);
        assert_eq!(settings.indent_width, 4);
    }
}

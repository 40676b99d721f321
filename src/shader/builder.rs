//! Shader Builder
//!
//! Turns a [`ShaderConfig`] into a [`CompiledShader`]:
//!
//! 1. resolve attribute / varying / output locations
//! 2. render the stage wrapper (input and output structs around the entry
//!    template) for the vertex and the fragment stage
//! 3. run the [`TemplateProcessor`] per stage, vertex first, into one
//!    shared binding list
//! 4. format, then verify each stage
//!
//! Caching lives one level up, in [`CompilerContext`](super::CompilerContext).

use std::fmt::Write as _;

use minijinja::context;

use super::assets::{STAGE_WRAPPER, default_entry_template, stage_env};
use super::bindings::BindingSet;
use super::config::ShaderConfig;
use super::formatter::format_source;
use super::library::ChunkLibrary;
use super::processor::TemplateProcessor;
use super::settings::CompilerSettings;
use super::stage::Stage;
use super::structs::StructRegistry;
use crate::errors::{ForgeError, Result};

/// Substrings that betray a broken substitution somewhere upstream.
const VERIFICATION_MARKERS: [&str; 2] = ["undefined", "[Object"];

const STAGES: [Stage; 2] = [Stage::Vertex, Stage::Fragment];

/// The two finished stage programs of one configuration.
///
/// Shared through `Arc` by every [`Shader`](super::Shader) built from an
/// identical configuration.
#[derive(Debug)]
pub struct CompiledShader {
    hash: u128,
    name: String,
    vertex_source: String,
    fragment_source: String,
    bindings: BindingSet,
}

impl CompiledShader {
    /// Configuration hash this result is cached under.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> u128 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    #[inline]
    #[must_use]
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    #[must_use]
    pub fn source(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Vertex => Some(&self.vertex_source),
            Stage::Fragment => Some(&self.fragment_source),
            Stage::Compute => None,
        }
    }

    /// Ordered, slot-unique bindings of both stages.
    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    #[inline]
    #[must_use]
    pub fn entry_point(stage: Stage) -> &'static str {
        stage.entry_point()
    }
}

/// Borrowed state needed for one build.
pub(crate) struct ShaderBuilder<'a> {
    pub library: &'a ChunkLibrary,
    pub structs: &'a StructRegistry,
    pub settings: &'a CompilerSettings,
}

impl ShaderBuilder<'_> {
    pub fn build(&self, config: &ShaderConfig, hash: u128) -> Result<CompiledShader> {
        let inline = config.inline_chunks();
        let chunk_names = config.chunk_names();
        let processor = TemplateProcessor::new(self.library, self.structs)
            .with_inline_chunks(&inline)
            .strict(self.settings.strict)
            .label(&config.name);

        let mut bindings = BindingSet::new();
        let mut sources = Vec::with_capacity(STAGES.len());

        for stage in STAGES {
            let wrapped = wrap_stage(config, stage)?;
            let text = processor.process(&wrapped, &config.flags, chunk_names.as_slice(), &mut bindings)?;
            let text = if self.settings.format_output {
                format_source(&text, self.settings.indent_width)
            } else {
                text
            };

            if self.settings.debug_print {
                log::debug!(
                    "================= Generated {stage} stage of '{}' =================\n{text}",
                    config.name
                );
            }

            verify(&config.name, stage, &text)?;
            #[cfg(feature = "naga")]
            if self.settings.validate {
                validate_wgsl(&config.name, stage, &text)?;
            }
            sources.push(text);
        }

        let fragment_source = sources.pop().unwrap_or_default();
        let vertex_source = sources.pop().unwrap_or_default();

        Ok(CompiledShader {
            hash,
            name: config.name.clone(),
            vertex_source,
            fragment_source,
            bindings,
        })
    }
}

fn location(explicit: Option<u32>, index: usize) -> u32 {
    explicit.unwrap_or_else(|| u32::try_from(index).unwrap_or(u32::MAX))
}

fn varying_fields(config: &ShaderConfig) -> impl Iterator<Item = String> + '_ {
    config.varyings.iter().enumerate().map(|(i, v)| {
        let mut field = format!("@location({}) ", location(None, i));
        if let Some(mode) = &v.interpolation {
            let _ = write!(field, "@interpolate({mode}) ");
        }
        let _ = write!(field, "{}: {}", v.name, v.ty);
        field
    })
}

/// Field declarations of the `(input, output)` structs of `stage`.
pub(crate) fn stage_fields(config: &ShaderConfig, stage: Stage) -> (Vec<String>, Vec<String>) {
    let position = "@builtin(position) position: vec4<f32>".to_owned();
    match stage {
        Stage::Vertex => {
            let mut input = vec![
                "@builtin(vertex_index) vertex_index: u32".to_owned(),
                "@builtin(instance_index) instance_index: u32".to_owned(),
            ];
            input.extend(config.attributes.iter().enumerate().map(|(i, a)| {
                format!("@location({}) {}: {}", location(a.location, i), a.name, a.ty)
            }));

            let mut output = vec![position];
            output.extend(varying_fields(config));
            (input, output)
        }
        Stage::Fragment => {
            let mut input = vec![
                position,
                "@builtin(front_facing) front_facing: bool".to_owned(),
            ];
            input.extend(varying_fields(config));

            let output = if config.outputs.is_empty() {
                vec!["@location(0) color: vec4<f32>".to_owned()]
            } else {
                config
                    .outputs
                    .iter()
                    .enumerate()
                    .map(|(i, o)| format!("@location({}) {}: {}", location(o.location, i), o.name, o.ty))
                    .collect()
            };
            (input, output)
        }
        Stage::Compute => (vec![], vec![]),
    }
}

/// Renders the stage wrapper around the configured (or default) entry template.
fn wrap_stage(config: &ShaderConfig, stage: Stage) -> Result<String> {
    let entry = match config.entry_template(stage) {
        Some(template) => template.to_owned(),
        None => default_entry_template(stage).unwrap_or_default(),
    };
    let (input_fields, output_fields) = stage_fields(config, stage);

    let template = stage_env().get_template(STAGE_WRAPPER)?;
    let text = template.render(context! {
        stage => stage.name(),
        input_type => stage.input_type(),
        output_type => stage.output_type(),
        input_fields => input_fields,
        output_fields => output_fields,
        entry => entry,
    })?;
    Ok(text)
}

fn verify(shader: &str, stage: Stage, text: &str) -> Result<()> {
    match VERIFICATION_MARKERS.iter().find(|m| text.contains(*m)) {
        Some(marker) => Err(ForgeError::Verification {
            shader: shader.to_owned(),
            stage,
            reason: format!("generated source contains '{marker}'"),
            text: text.to_owned(),
        }),
        None => Ok(()),
    }
}

#[cfg(feature = "naga")]
fn validate_wgsl(shader: &str, stage: Stage, text: &str) -> Result<()> {
    naga::front::wgsl::parse_str(text)
        .map(|_| ())
        .map_err(|e| ForgeError::Validation {
            shader: shader.to_owned(),
            stage,
            message: e.emit_to_string(text),
            text: text.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_fields() {
        let config = ShaderConfig::new("s")
            .attribute("position", "vec3<f32>")
            .attribute_at(5, "uv", "vec2<f32>")
            .varying_interpolated("id", "u32", "flat");

        let (vin, vout) = stage_fields(&config, Stage::Vertex);
        assert_eq!(vin[2], "@location(0) position: vec3<f32>");
        assert_eq!(vin[3], "@location(5) uv: vec2<f32>");
        assert_eq!(vout[1], "@location(0) @interpolate(flat) id: u32");

        let (fin, fout) = stage_fields(&config, Stage::Fragment);
        assert_eq!(fin[1], "@builtin(front_facing) front_facing: bool");
        assert_eq!(fin[2], vout[1]);
        assert_eq!(fout, vec!["@location(0) color: vec4<f32>".to_owned()]);
    }

    #[test]
    fn test_wrapper_declares_stage_structs() {
        let config = ShaderConfig::new("wrapped").attribute("position", "vec3<f32>");
        let text = wrap_stage(&config, Stage::Vertex).unwrap();
        assert!(text.contains("struct VertexInput {"));
        assert!(text.contains("@location(0) position: vec3<f32>,"));
        assert!(text.contains("struct VertexOutput {"));
        assert!(text.contains("{{vertex}}"));
    }

    #[test]
    fn test_wrapper_keeps_name_out_of_source() {
        let config = ShaderConfig::new("undefined\n@group(3) @binding(0) var<uniform> stray: S;");
        let text = wrap_stage(&config, Stage::Fragment).unwrap();
        assert!(text.starts_with("// fragment stage\n"));
        assert!(!text.contains("undefined"));
        assert!(!text.contains("stray"));
    }

    #[test]
    fn test_verify_rejects_artifacts() {
        assert!(verify("s", Stage::Vertex, "let a = 1.0;").is_ok());
        let err = verify("s", Stage::Fragment, "let a = undefined;").unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Fragment));
        assert_eq!(err.generated_source(), Some("let a = undefined;"));
    }
}

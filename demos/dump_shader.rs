//! Composes a lit shader from the built-in chunks and prints both stages
//! together with the bindings they declare.
//!
//! ```text
//! RUST_LOG=debug cargo run --example dump_shader -- USE_GAMMA USE_NORMAL
//! ```
//!
//! Every command-line argument is enabled as a boolean feature flag.

use anyhow::Result;

use wgsl_forge::shader::{CompilerContext, CompilerSettings, Shader, ShaderConfig};

fn main() -> Result<()> {
    env_logger::init();

    let ctx = CompilerContext::with_settings(CompilerSettings {
        debug_print: true,
        ..Default::default()
    });

    let mut config = ShaderConfig::new("dump_lit")
        .attribute("position", "vec3<f32>")
        .attribute("normal", "vec3<f32>")
        .attribute("uv", "vec2<f32>")
        .varying("normal", "vec3<f32>")
        .varying("uv", "vec2<f32>")
        .chunks(["transform", "color_begin", "fog", "gamma", "color_end"]);
    for flag in std::env::args().skip(1) {
        config = config.flag(&flag, true);
    }

    let shader = Shader::new(&ctx, config)?;

    println!("// ===== vertex ({}) =====", shader.hash());
    println!("{}", shader.vertex_source());
    println!("// ===== fragment =====");
    println!("{}", shader.fragment_source());

    println!("// ===== bindings =====");
    for binding in shader.bindings() {
        println!(
            "// @group({}) @binding({}) {} {}: {} visible in {:?}",
            binding.group,
            binding.binding,
            binding.storage_kind,
            binding.name,
            binding.ty,
            binding.visibility.stages().collect::<Vec<_>>(),
        );
    }

    Ok(())
}

//! Template Composition Tests
//!
//! Tests for:
//! - Chunk parsing (stage blocks, order rules, shared declarations)
//! - Stage ordering (first / last / before / after)
//! - `#if` expansion inside chunk bodies
//! - Template processing (inclusion, placeholder substitution, bindings)
//! - Source formatting

use std::sync::Arc;

use wgsl_forge::shader::{
    BindingSet, Chunk, ChunkLibrary, FeatureFlags, OrderRule, Stage, StructDefinition,
    StructRegistry, TemplateProcessor, expand_conditionals, format_source, sort_chunks,
};

const FRAGMENT_TEMPLATE: &str = "@fragment(input) -> output {\n    {{fragment}}\n    return output;\n}\n";

fn names(chunks: &[Arc<Chunk>]) -> Vec<&str> {
    chunks.iter().map(|c| c.name()).collect()
}

fn fragment_chunk(name: &str, rule: &str) -> Arc<Chunk> {
    Arc::new(Chunk::new(name, format!("@fragment{rule} {{{{ {name}(); }}}}")))
}

fn process(
    library: &ChunkLibrary,
    template: &str,
    flags: &FeatureFlags,
    chunks: &[&str],
) -> (String, BindingSet) {
    let structs = StructRegistry::new();
    let mut bindings = BindingSet::new();
    let text = TemplateProcessor::new(library, &structs)
        .process(template, flags, chunks, &mut bindings)
        .expect("processing should succeed");
    (text, bindings)
}

// ============================================================================
// Chunk Parsing
// ============================================================================

#[test]
fn chunk_splits_stage_blocks_from_shared_text() {
    let chunk = Chunk::new(
        "comp_lighting",
        "struct Light { color: vec3<f32> }\n\
         @vertex {{ v(); }}\n\
         fn shade() -> f32 { return 1.0; }\n\
         @fragment(after:comp_base) {{ if (a) { b(); }}}",
    );

    assert_eq!(chunk.code(Stage::Vertex), "v();");
    assert_eq!(chunk.code(Stage::Fragment), "if (a) { b(); }");
    assert!(chunk.code(Stage::Compute).is_empty());
    assert_eq!(
        chunk.order_rule(Stage::Fragment),
        Some(&OrderRule::After("comp_base".into()))
    );
    assert!(chunk.shared_declarations().contains("struct Light"));
    assert!(chunk.shared_declarations().contains("fn shade()"));
    assert!(!chunk.is_declaration_only());
    assert!(chunk.diagnostics().is_empty());
}

#[test]
fn chunk_without_blocks_is_declaration_only() {
    let chunk = Chunk::new("comp_consts", "const A: f32 = 1.0;");
    assert!(chunk.is_declaration_only());
    assert!(chunk.stages().is_empty());
    assert_eq!(chunk.shared_declarations(), "const A: f32 = 1.0;");
}

#[test]
fn unterminated_block_falls_back_to_shared_text() {
    let chunk = Chunk::new("comp_broken", "@fragment {{ never_closed();");
    assert!(chunk.code(Stage::Fragment).is_empty());
    assert!(chunk.shared_declarations().contains("never_closed();"));
    assert_eq!(chunk.diagnostics().len(), 1);
}

#[test]
fn unknown_order_rule_means_no_rule() {
    let chunk = Chunk::new("comp_sideways", "@fragment(sideways) {{ x(); }}");
    assert_eq!(chunk.code(Stage::Fragment), "x();");
    assert_eq!(chunk.order_rule(Stage::Fragment), None);
    assert_eq!(chunk.diagnostics().len(), 1);
}

// ============================================================================
// Stage Ordering
// ============================================================================

#[test]
fn ordering_first_none_last() {
    let chunks = [
        fragment_chunk("ord_c", "(last)"),
        fragment_chunk("ord_b", ""),
        fragment_chunk("ord_a", "(first)"),
    ];
    let sorted = sort_chunks(&chunks, Stage::Fragment);
    assert_eq!(names(&sorted), ["ord_a", "ord_b", "ord_c"]);
}

#[test]
fn ordering_before_target() {
    let chunks = [
        fragment_chunk("ord_x", "(before:ord_b)"),
        fragment_chunk("ord_a", ""),
        fragment_chunk("ord_b", ""),
        fragment_chunk("ord_c", ""),
    ];
    let sorted = sort_chunks(&chunks, Stage::Fragment);
    assert_eq!(names(&sorted), ["ord_a", "ord_x", "ord_b", "ord_c"]);
}

#[test]
fn ordering_missing_target_appends() {
    let chunks = [
        fragment_chunk("ord_x", "(before:ord_missing)"),
        fragment_chunk("ord_a", ""),
        fragment_chunk("ord_c", "(last)"),
    ];
    let sorted = sort_chunks(&chunks, Stage::Fragment);
    assert_eq!(names(&sorted), ["ord_a", "ord_c", "ord_x"]);
}

#[test]
fn ordering_later_first_wins_front() {
    let chunks = [
        fragment_chunk("ord_f1", "(first)"),
        fragment_chunk("ord_f2", "(first)"),
        fragment_chunk("ord_n", ""),
    ];
    let sorted = sort_chunks(&chunks, Stage::Fragment);
    assert_eq!(names(&sorted), ["ord_f2", "ord_f1", "ord_n"]);
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn conditional_selects_branch() {
    let src = r#"#if DAY { "sun" } else { "moon" }"#;

    let day = expand_conditionals(src, &FeatureFlags::new().with("DAY", true));
    assert!(day.contains("\"sun\"") && !day.contains("moon"));

    let night = expand_conditionals(src, &FeatureFlags::new().with("DAY", false));
    assert!(night.contains("\"moon\"") && !night.contains("sun"));
}

#[test]
fn conditional_nested_keeps_outer_text() {
    let src = r#"#if OUTER { keep #if INNER { "x" } also }"#;
    let flags = FeatureFlags::new().with("OUTER", true).with("INNER", false);
    let out = expand_conditionals(src, &flags);
    assert!(out.contains("keep"));
    assert!(out.contains("also"));
    assert!(!out.contains("\"x\""));
}

// ============================================================================
// Template Processing
// ============================================================================

#[test]
fn fog_runs_before_gamma_regardless_of_list_order() {
    let mut library = ChunkLibrary::new();
    library.add(Chunk::new("tp_gamma", "@fragment(last) {{ color = gamma(color); }}"));
    library.add(Chunk::new("tp_fog", "@fragment {{ color = fog(color); }}"));

    for list in [["tp_gamma", "tp_fog"], ["tp_fog", "tp_gamma"]] {
        let (text, _) = process(&library, FRAGMENT_TEMPLATE, &FeatureFlags::new(), &list);
        let fog = text.find("color = fog(color);").expect("fog code");
        let gamma = text.find("color = gamma(color);").expect("gamma code");
        assert!(fog < gamma, "fog must precede gamma for {list:?}");
    }
}

#[test]
fn duplicate_binding_from_include_is_dropped() {
    let mut library = ChunkLibrary::new();
    library.add(Chunk::new(
        "tp_scene",
        "@group(0) @binding(0) var<uniform> scene: Scene;",
    ));
    let template = format!("@group(0) @binding(0) var<uniform> scene: Scene;\n{FRAGMENT_TEMPLATE}");

    let (_, bindings) = process(&library, &template, &FeatureFlags::new(), &["tp_scene"]);
    assert_eq!(bindings.len(), 1);
    let scene = bindings.get(0, 0).unwrap();
    assert_eq!(scene.name, "scene");
    assert_eq!(scene.storage_kind, "uniform");
}

#[test]
fn declaration_only_chunk_never_enters_body() {
    let mut library = ChunkLibrary::new();
    library.add(Chunk::new("tp_consts", "const TP_SCALE: f32 = 2.0;"));

    let (text, _) = process(&library, FRAGMENT_TEMPLATE, &FeatureFlags::new(), &["tp_consts"]);
    let decl = text.find("const TP_SCALE").unwrap();
    let entry = text.find("fn fs_main").unwrap();
    assert!(decl < entry);
    assert_eq!(text.matches("TP_SCALE").count(), 1);
}

#[test]
fn explicit_include_forms_resolve() {
    let mut library = ChunkLibrary::new();
    library.add(Chunk::new("tp_angle", "@fragment {{ angle(); }}"));
    library.add(Chunk::new("tp_quote", "@fragment {{ quote(); }}"));

    let template = format!("#include <tp_angle>\n#include \"tp_quote\"\n{FRAGMENT_TEMPLATE}");
    let (text, _) = process(&library, &template, &FeatureFlags::new(), &[]);
    assert!(text.contains("angle();"));
    assert!(text.contains("quote();"));
    assert!(!text.contains("#include"));
}

#[test]
fn struct_macro_and_variables_expand() {
    let mut structs = StructRegistry::new();
    structs.add(
        StructDefinition::new("TpMaterial")
            .field::<glam::Vec4>("base_color")
            .field::<f32>("roughness"),
    );
    let library = ChunkLibrary::new();
    let template = format!(
        "struct TpMaterial {{ #struct(TpMaterial) }}\nconst EXPOSURE: f32 = ${{EXPOSURE}};\n{FRAGMENT_TEMPLATE}"
    );
    let flags = FeatureFlags::new().with("EXPOSURE", 1.0);

    let mut bindings = BindingSet::new();
    let text = TemplateProcessor::new(&library, &structs)
        .process(&template, &flags, &[] as &[&str], &mut bindings)
        .unwrap();
    assert!(text.contains("base_color: vec4<f32>,\nroughness: f32,"));
    assert!(text.contains("const EXPOSURE: f32 = 1.0;"));
}

// ============================================================================
// Formatting
// ============================================================================

#[test]
fn formatter_normalizes_spliced_bodies() {
    let src = "fn f() {\n        a();\n  if (b) {\nc();\n}\n\n\n}";
    assert_eq!(
        format_source(src, 4),
        "fn f() {\n    a();\n    if (b) {\n        c();\n    }\n}\n"
    );
}

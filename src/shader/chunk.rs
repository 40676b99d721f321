//! Shader Chunks
//!
//! A chunk is a small named WGSL fragment authored as a single template:
//!
//! ```text
//! fn apply_fog(color: vec3<f32>, depth: f32) -> vec3<f32> { ... }
//!
//! @fragment(before:gamma) {{
//!     color = apply_fog(color, input.position.z);
//! }}
//! ```
//!
//! Text inside `@<stage>(<rule>) {{ ... }}` blocks becomes that stage's code;
//! everything else becomes shared declarations visible to every stage that
//! includes the chunk.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::scan;
use super::stage::{Stage, StageSet};
use crate::utils::interner::{self, Symbol};

/// Requested position of a chunk's code within a stage body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderRule {
    First,
    Last,
    Before(String),
    After(String),
}

impl OrderRule {
    /// Parses an order argument. An empty argument means "no rule".
    ///
    /// Returns `Err` with the raw text when the argument is not recognised.
    pub fn parse(arg: &str) -> Result<Option<Self>, String> {
        let arg = arg.trim();
        match arg {
            "" => Ok(None),
            "first" => Ok(Some(Self::First)),
            "last" => Ok(Some(Self::Last)),
            _ => {
                if let Some(target) = arg.strip_prefix("before:") {
                    Ok(Some(Self::Before(target.trim().to_owned())))
                } else if let Some(target) = arg.strip_prefix("after:") {
                    Ok(Some(Self::After(target.trim().to_owned())))
                } else {
                    Err(arg.to_owned())
                }
            }
        }
    }
}

impl fmt::Display for OrderRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Last => f.write_str("last"),
            Self::Before(target) => write!(f, "before:{target}"),
            Self::After(target) => write!(f, "after:{target}"),
        }
    }
}

/// Problems found while parsing a chunk template.
///
/// None of these fail construction; the offending text is kept as shared
/// declarations. A strict build turns them into errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkDiagnostic {
    /// A `{{` with no closing `}}`.
    UnterminatedBlock { stage: Stage, offset: usize },
    /// An order argument that is not `first`, `last`, `before:X` or `after:X`.
    UnknownOrderRule { stage: Stage, rule: String },
    /// A second block for a stage that already had one; the later block wins.
    DuplicateBlock { stage: Stage },
}

impl fmt::Display for ChunkDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedBlock { stage, offset } => {
                write!(f, "unterminated @{stage} block at byte {offset}")
            }
            Self::UnknownOrderRule { stage, rule } => {
                write!(f, "unknown order rule '{rule}' on @{stage} block")
            }
            Self::DuplicateBlock { stage } => write!(f, "duplicate @{stage} block"),
        }
    }
}

/// An immutable named shader fragment.
#[derive(Debug, Clone)]
pub struct Chunk {
    name: String,
    symbol: Symbol,
    template: String,
    code: [String; 3],
    order: [Option<OrderRule>; 3],
    shared: String,
    diagnostics: Vec<ChunkDiagnostic>,
}

impl Chunk {
    /// Parses `template` into per-stage code and shared declarations.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        let name = name.into();
        let template = template.into();
        let parsed = parse_template(&template);

        for diagnostic in &parsed.diagnostics {
            log::warn!("Chunk '{name}': {diagnostic}");
        }

        Self {
            symbol: interner::intern(&name),
            name,
            template,
            code: parsed.code,
            order: parsed.order,
            shared: parsed.shared,
            diagnostics: parsed.diagnostics,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// The raw authoring source.
    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Code body for `stage`; empty when the chunk has no block for it.
    #[inline]
    #[must_use]
    pub fn code(&self, stage: Stage) -> &str {
        &self.code[stage.index()]
    }

    #[inline]
    #[must_use]
    pub fn order_rule(&self, stage: Stage) -> Option<&OrderRule> {
        self.order[stage.index()].as_ref()
    }

    /// Template text outside every stage block.
    #[inline]
    #[must_use]
    pub fn shared_declarations(&self) -> &str {
        &self.shared
    }

    /// Stages this chunk contributes code to.
    #[must_use]
    pub fn stages(&self) -> StageSet {
        Stage::ALL
            .into_iter()
            .filter(|s| !self.code(*s).is_empty())
            .fold(StageSet::empty(), |set, s| set | s.into())
    }

    /// A chunk that only provides shared declarations.
    #[inline]
    #[must_use]
    pub fn is_declaration_only(&self) -> bool {
        self.stages().is_empty()
    }

    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[ChunkDiagnostic] {
        &self.diagnostics
    }
}

/// Hashing serializes a chunk by its authoring source; everything else is derived.
impl Serialize for Chunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Chunk", 2)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("template", &self.template)?;
        state.end()
    }
}

#[derive(Default)]
struct ParsedTemplate {
    code: [String; 3],
    order: [Option<OrderRule>; 3],
    shared: String,
    diagnostics: Vec<ChunkDiagnostic>,
}

struct StageBlock<'a> {
    stage: Stage,
    rule: &'a str,
    body: &'a str,
    end: usize,
}

fn parse_template(src: &str) -> ParsedTemplate {
    let mut parsed = ParsedTemplate::default();
    let mut shared = String::with_capacity(src.len());
    let bytes = src.as_bytes();
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(next) = scan::skip_comment(src, i) {
            i = next;
            continue;
        }
        if bytes[i] != b'@' {
            i += 1;
            continue;
        }
        match parse_stage_block(src, i) {
            Some(Ok(block)) => {
                shared.push_str(&src[last..i]);
                last = block.end;
                i = block.end;
                parsed.store(&block);
            }
            Some(Err(diagnostic)) => {
                parsed.diagnostics.push(diagnostic);
                i += 1;
            }
            None => i += 1,
        }
    }
    shared.push_str(&src[last..]);
    parsed.shared = shared.trim().to_owned();
    parsed
}

impl ParsedTemplate {
    fn store(&mut self, block: &StageBlock<'_>) {
        let idx = block.stage.index();
        if !self.code[idx].is_empty() {
            self.diagnostics.push(ChunkDiagnostic::DuplicateBlock { stage: block.stage });
        }
        self.code[idx] = block.body.trim().to_owned();
        self.order[idx] = match OrderRule::parse(block.rule) {
            Ok(rule) => rule,
            Err(rule) => {
                self.diagnostics.push(ChunkDiagnostic::UnknownOrderRule {
                    stage: block.stage,
                    rule,
                });
                None
            }
        };
    }
}

/// Tries to read `@stage(rule) {{ body }}` at `at`.
///
/// `None` means the text is not a stage block at all (e.g. an entry-point
/// marker or a WGSL attribute); `Some(Err)` means a block was opened but never
/// closed.
fn parse_stage_block(src: &str, at: usize) -> Option<Result<StageBlock<'_>, ChunkDiagnostic>> {
    let (ident, mut i) = scan::read_ident(src, at + 1)?;
    let stage = Stage::from_name(ident)?;

    i = scan::skip_ws(src, i);
    let mut rule = "";
    if src.as_bytes().get(i) == Some(&b'(') {
        let (inner, next) = scan::read_parens(src, i)?;
        rule = inner;
        i = scan::skip_ws(src, next);
    }

    if !src[i..].starts_with("{{") {
        return None;
    }
    let body_start = i + 2;
    let Some(close) = scan::find_double_close(src, body_start) else {
        return Some(Err(ChunkDiagnostic::UnterminatedBlock { stage, offset: at }));
    };

    Some(Ok(StageBlock {
        stage,
        rule,
        body: &src[body_start..close],
        end: close + 2,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_stage_blocks_and_rules() {
        let chunk = Chunk::new(
            "fog",
            "fn fog(c: vec3<f32>) -> vec3<f32> { return c; }\n\
             @fragment(before:gamma) {{ color = fog(color); }}\n\
             @vertex {{ output.depth = 1.0; }}",
        );

        assert_eq!(chunk.code(Stage::Fragment), "color = fog(color);");
        assert_eq!(chunk.code(Stage::Vertex), "output.depth = 1.0;");
        assert_eq!(chunk.code(Stage::Compute), "");
        assert_eq!(
            chunk.order_rule(Stage::Fragment),
            Some(&OrderRule::Before("gamma".into()))
        );
        assert_eq!(chunk.order_rule(Stage::Vertex), None);
        assert_eq!(
            chunk.shared_declarations(),
            "fn fog(c: vec3<f32>) -> vec3<f32> { return c; }"
        );
        assert_eq!(chunk.stages(), StageSet::VERTEX | StageSet::FRAGMENT);
        assert!(chunk.diagnostics().is_empty());
    }

    #[test]
    fn test_declaration_only_chunk() {
        let src = "const PI: f32 = 3.14159;\nfn sq(x: f32) -> f32 { return x * x; }";
        let chunk = Chunk::new("math", src);
        assert!(chunk.is_declaration_only());
        assert_eq!(chunk.shared_declarations(), src);
    }

    #[test]
    fn test_nested_scopes_inside_body() {
        let chunk = Chunk::new(
            "clip",
            "@fragment() {{\n    if (color.a < 0.5) { discard; }}}",
        );
        assert_eq!(chunk.code(Stage::Fragment), "if (color.a < 0.5) { discard; }");
    }

    #[test]
    fn test_unterminated_block_degrades_to_shared_text() {
        let src = "@fragment(last) {{ color = vec4<f32>(1.0);";
        let chunk = Chunk::new("broken", src);

        assert!(chunk.is_declaration_only());
        assert_eq!(chunk.shared_declarations(), src);
        assert!(matches!(
            chunk.diagnostics(),
            [ChunkDiagnostic::UnterminatedBlock { stage: Stage::Fragment, .. }]
        ));
    }

    #[test]
    fn test_entry_marker_is_not_a_block() {
        let src = "@vertex(input) -> output {\n    {{vertex}}\n}";
        let chunk = Chunk::new("entry", src);
        assert!(chunk.is_declaration_only());
        assert!(chunk.diagnostics().is_empty());
    }

    #[test]
    fn test_unknown_order_rule_is_ignored() {
        let chunk = Chunk::new("odd", "@fragment(middle) {{ x = 1; }}");
        assert_eq!(chunk.code(Stage::Fragment), "x = 1;");
        assert_eq!(chunk.order_rule(Stage::Fragment), None);
        assert_eq!(chunk.diagnostics().len(), 1);
    }

    #[test]
    fn test_order_rule_parse() {
        assert_eq!(OrderRule::parse(""), Ok(None));
        assert_eq!(OrderRule::parse("first"), Ok(Some(OrderRule::First)));
        assert_eq!(
            OrderRule::parse("after: lighting"),
            Ok(Some(OrderRule::After("lighting".into())))
        );
        assert_eq!(OrderRule::parse("sideways"), Err("sideways".into()));
    }
}

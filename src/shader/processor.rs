//! Template Processor
//!
//! Turns one stage template into final WGSL. The passes run strictly in this
//! order:
//!
//! 1. `#if` conditional expansion
//! 2. chunk-list insertion as `#include <name>` directives
//! 3. include resolution: chunk lookup, stage ordering, body substitution
//!    into the `{{stage}}` placeholder, shared declarations prepended
//! 4. entry-point signature expansion (`@vertex(input) -> output {`)
//! 5. `#if` expansion again, for conditionals brought in by chunks
//! 6. `#struct(Name)` expansion
//! 7. `${KEY}` substitution
//! 8. binding extraction
//!
//! Unknown chunk names contribute nothing unless the processor is strict.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use super::bindings::{BindingSet, extract_bindings};
use super::chunk::Chunk;
use super::conditional::expand_conditionals;
use super::defines::FeatureFlags;
use super::library::ChunkLibrary;
use super::ordering::sort_chunks;
use super::scan;
use super::stage::Stage;
use super::structs::StructRegistry;
use crate::errors::{ForgeError, Result};

/// Workgroup size emitted for compute entry points.
pub const DEFAULT_WORKGROUP_SIZE: u32 = 64;

pub struct TemplateProcessor<'a> {
    library: &'a ChunkLibrary,
    structs: &'a StructRegistry,
    inline: &'a [Arc<Chunk>],
    strict: bool,
    label: &'a str,
}

impl<'a> TemplateProcessor<'a> {
    #[must_use]
    pub fn new(library: &'a ChunkLibrary, structs: &'a StructRegistry) -> Self {
        Self {
            library,
            structs,
            inline: &[],
            strict: false,
            label: "<anonymous>",
        }
    }

    /// Chunks that shadow library entries of the same name.
    #[must_use]
    pub fn with_inline_chunks(mut self, chunks: &'a [Arc<Chunk>]) -> Self {
        self.inline = chunks;
        self
    }

    /// Turns unresolved names and malformed chunks into errors.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Name used in log lines and errors.
    #[must_use]
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    /// Runs the full pipeline over `template`.
    ///
    /// Bindings found in the final text are appended to `bindings`.
    pub fn process<S: AsRef<str>>(
        &self,
        template: &str,
        flags: &FeatureFlags,
        chunk_list: &[S],
        bindings: &mut BindingSet,
    ) -> Result<String> {
        let text = expand_conditionals(template, flags);
        let text = insert_includes(&text, chunk_list);
        let stage = detect_stage(&text);
        let text = self.resolve_includes(&text, stage)?;
        let text = expand_signatures(&text);
        let text = expand_conditionals(&text, flags);
        let text = self.expand_structs(&text);
        let text = substitute_variables(&text, flags);
        extract_bindings(&text, stage, bindings);
        Ok(text)
    }

    fn lookup(&self, name: &str) -> Option<Arc<Chunk>> {
        self.inline
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .or_else(|| self.library.get(name))
    }

    /// Resolves every included name, following includes inside chunks.
    fn collect_chunks(&self, text: &str) -> Result<Vec<Arc<Chunk>>> {
        let mut names = include_names(text);
        let mut seen: FxHashSet<String> = names.iter().cloned().collect();
        let mut chunks = Vec::with_capacity(names.len());
        let mut idx = 0;

        while idx < names.len() {
            let name = &names[idx];
            idx += 1;

            let Some(chunk) = self.lookup(name) else {
                if self.strict {
                    return Err(ForgeError::UnresolvedChunk {
                        shader: self.label.to_owned(),
                        name: name.clone(),
                    });
                }
                log::warn!("Shader '{}': chunk '{name}' is not registered; skipped", self.label);
                continue;
            };

            if self.strict
                && let Some(diagnostic) = chunk.diagnostics().first()
            {
                return Err(ForgeError::MalformedChunk {
                    name: chunk.name().to_owned(),
                    detail: diagnostic.to_string(),
                });
            }

            for nested in include_names(chunk.template()) {
                if seen.insert(nested.clone()) {
                    names.push(nested);
                }
            }
            chunks.push(chunk);
        }

        Ok(chunks)
    }

    fn resolve_includes(&self, text: &str, stage: Option<Stage>) -> Result<String> {
        let chunks = self.collect_chunks(text)?;
        let mut body = strip_includes(text);

        match stage {
            Some(stage) => {
                let relevant: Vec<_> = chunks
                    .iter()
                    .filter(|c| !c.code(stage).is_empty() || c.is_declaration_only())
                    .cloned()
                    .collect();
                let sorted = sort_chunks(&relevant, stage);
                log::trace!(
                    "Shader '{}' {stage} chunk order: {:?}",
                    self.label,
                    sorted.iter().map(|c| c.name()).collect::<Vec<_>>()
                );

                let code = sorted
                    .iter()
                    .map(|c| c.code(stage))
                    .filter(|code| !code.is_empty())
                    .map(strip_includes)
                    .collect::<Vec<_>>()
                    .join("\n");
                body = body.replace(&stage.placeholder(), &code);
            }
            None if !chunks.is_empty() => {
                log::debug!(
                    "Shader '{}': no stage marker found; only shared declarations are included",
                    self.label
                );
            }
            None => {}
        }

        let mut out = String::with_capacity(body.len());
        for chunk in &chunks {
            let shared = strip_includes(chunk.shared_declarations());
            let shared = shared.trim();
            if !shared.is_empty() {
                out.push_str(shared);
                out.push_str("\n\n");
            }
        }
        out.push_str(&body);
        Ok(out)
    }

    fn expand_structs(&self, text: &str) -> String {
        replace_macros(text, "#struct(", b')', |name| {
            let name = name.trim();
            Some(match self.structs.get(name) {
                Some(def) => def.field_list(),
                None => {
                    log::warn!("Shader '{}': unknown struct '{name}' in #struct()", self.label);
                    String::new()
                }
            })
        })
    }
}

/// Parses a `#include` directive line: `#include name`, `<name>` or `"name"`.
pub(crate) fn parse_include(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("#include")?;
    if !rest.starts_with(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    let rest = rest.trim();
    let name = if let Some(inner) = rest.strip_prefix('<') {
        inner.strip_suffix('>')?
    } else if let Some(inner) = rest.strip_prefix('"') {
        inner.strip_suffix('"')?
    } else {
        rest
    };
    let name = name.trim();
    (!name.is_empty() && !name.contains(char::is_whitespace)).then_some(name)
}

/// Each line of `text` paired with the name it includes, if it is an
/// `#include` directive outside a block comment.
fn directive_lines(text: &str) -> impl Iterator<Item = (&str, Option<&str>)> {
    let mut in_comment = false;
    text.split_inclusive('\n').map(move |line| {
        let name = if in_comment { None } else { parse_include(line) };
        in_comment = scan::block_comment_open_after(line, in_comment);
        (line, name)
    })
}

/// Distinct included names in order of first appearance.
fn include_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in directive_lines(text).filter_map(|(_, name)| name) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_owned());
        }
    }
    names
}

fn strip_includes(text: &str) -> String {
    directive_lines(text)
        .filter(|(_, name)| name.is_none())
        .map(|(line, _)| line)
        .collect()
}

/// Inserts `#include <name>` for each listed chunk after the last existing
/// directive, or at the very top when there is none.
fn insert_includes<S: AsRef<str>>(text: &str, chunk_list: &[S]) -> String {
    if chunk_list.is_empty() {
        return text.to_owned();
    }

    let mut pos = None;
    let mut offset = 0;
    for (line, name) in directive_lines(text) {
        offset += line.len();
        if name.is_some() {
            pos = Some(offset);
        }
    }

    let directives: String = chunk_list
        .iter()
        .map(|name| format!("#include <{}>\n", name.as_ref()))
        .collect();

    let pos = pos.unwrap_or(0);
    let mut out = String::with_capacity(text.len() + directives.len() + 1);
    out.push_str(&text[..pos]);
    if pos > 0 && !text[..pos].ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&directives);
    out.push_str(&text[pos..]);
    out
}

/// The stage the template body is for: the first `@<stage>` marker or
/// `{{<stage>}}` placeholder outside comments.
#[must_use]
pub fn detect_stage(text: &str) -> Option<Stage> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(next) = scan::skip_comment(text, i) {
            i = next;
            continue;
        }
        if bytes[i] == b'@'
            && let Some((ident, _)) = scan::read_ident(text, i + 1)
            && let Some(stage) = Stage::from_name(ident)
        {
            return Some(stage);
        }
        if bytes[i..].starts_with(b"{{")
            && let Some((ident, end)) = scan::read_ident(text, i + 2)
            && text[end..].starts_with("}}")
            && let Some(stage) = Stage::from_name(ident)
        {
            return Some(stage);
        }
        i += 1;
    }
    None
}

struct EntryMarker<'a> {
    stage: Stage,
    input: &'a str,
    output: &'a str,
}

fn parse_entry_marker(line: &str) -> Option<EntryMarker<'_>> {
    let rest = line.trim().strip_prefix('@')?;
    let (ident, i) = scan::read_ident(rest, 0)?;
    let stage = Stage::from_name(ident)?;
    let i = scan::skip_ws(rest, i);
    let (input, i) = scan::read_parens(rest, i)?;
    let rest = rest[i..].trim_start().strip_prefix("->")?.trim_start();
    let (output, i) = scan::read_ident(rest, 0)?;
    if rest[i..].trim() != "{" || scan::read_ident(input, 0)?.1 != input.len() {
        return None;
    }
    Some(EntryMarker {
        stage,
        input,
        output,
    })
}

/// Rewrites `@<stage>(<in>) -> <out> {` lines into entry-point declarations.
fn expand_signatures(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let Some(marker) = parse_entry_marker(line) else {
            out.push_str(line);
            continue;
        };

        let indent = &line[..line.len() - line.trim_start().len()];
        let stage = marker.stage;
        let input_ty = stage.input_type();
        let output_ty = stage.output_type();
        let entry = stage.entry_point();

        if stage == Stage::Compute {
            out.push_str(&format!(
                "{indent}@compute @workgroup_size({DEFAULT_WORKGROUP_SIZE})\n\
                 {indent}fn {entry}({}: {input_ty}) {{\n",
                marker.input
            ));
        } else {
            out.push_str(&format!(
                "{indent}@{stage}\n\
                 {indent}fn {entry}({}: {input_ty}) -> {output_ty} {{\n",
                marker.input
            ));
        }
        out.push_str(&format!("{indent}    var {}: {output_ty};", marker.output));
        if line.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Replaces `${KEY}` tokens with flag values; unknown keys stay untouched.
fn substitute_variables(text: &str, flags: &FeatureFlags) -> String {
    replace_macros(text, "${", b'}', |key| {
        flags.get(key.trim()).map(ToString::to_string)
    })
}

/// Replaces every `open ... close` macro outside comments.
///
/// `f` receives the text between the delimiters; `None` keeps the original.
fn replace_macros(
    text: &str,
    open: &str,
    close: u8,
    mut f: impl FnMut(&str) -> Option<String>,
) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(next) = scan::skip_comment(text, i) {
            i = next;
            continue;
        }
        if bytes[i..].starts_with(open.as_bytes()) {
            let start = i + open.len();
            let end = bytes[start..]
                .iter()
                .position(|&b| b == close || b == b'\n')
                .map(|p| start + p)
                .filter(|&p| bytes[p] == close);
            if let Some(end) = end
                && let Some(replacement) = f(&text[start..end])
            {
                out.push_str(&text[last..i]);
                out.push_str(&replacement);
                last = end + 1;
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&text[last..]);
    out
}

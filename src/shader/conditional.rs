//! Conditional Expansion
//!
//! Resolves `#if NAME { ... } else { ... }` blocks against a [`FeatureFlags`]
//! set. Bodies are delimited by brace matching, so they may contain ordinary
//! WGSL scopes and further `#if` blocks. The chosen body is expanded
//! recursively; the braces delimiting it are dropped.

use super::defines::FeatureFlags;
use super::scan;

struct IfBlock<'a> {
    flag: &'a str,
    then_body: &'a str,
    else_body: Option<&'a str>,
    end: usize,
}

/// Expands every `#if` block in `src`.
///
/// A block is enabled only when its flag is boolean `true`. Malformed blocks
/// (no opening brace, unbalanced braces) are kept verbatim.
#[must_use]
pub fn expand_conditionals(src: &str, flags: &FeatureFlags) -> String {
    let mut out = String::with_capacity(src.len());
    let bytes = src.as_bytes();
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(next) = scan::skip_comment(src, i) {
            i = next;
            continue;
        }
        if bytes[i] == b'#'
            && let Some(block) = parse_if(src, i)
        {
            out.push_str(&src[last..i]);
            let body = if flags.is_enabled(block.flag) {
                Some(block.then_body)
            } else {
                block.else_body
            };
            if let Some(body) = body {
                out.push_str(&expand_conditionals(body, flags));
            }
            last = block.end;
            i = block.end;
            continue;
        }
        i += 1;
    }

    out.push_str(&src[last..]);
    out
}

fn parse_if(src: &str, at: usize) -> Option<IfBlock<'_>> {
    let bytes = src.as_bytes();
    let rest = src.get(at..)?;
    if !rest.starts_with("#if") || !bytes.get(at + 3).is_some_and(u8::is_ascii_whitespace) {
        return None;
    }

    let i = scan::skip_ws(src, at + 3);
    let Some((flag, i)) = scan::read_ident(src, i) else {
        log::warn!("`#if` without a flag name at byte {at}; left as is");
        return None;
    };
    let open = scan::skip_ws(src, i);
    if bytes.get(open) != Some(&b'{') {
        log::warn!("`#if {flag}` is not followed by a block; left as is");
        return None;
    }
    let Some(close) = scan::find_matching_brace(src, open) else {
        log::warn!("`#if {flag}` block is never closed; left as is");
        return None;
    };

    let mut block = IfBlock {
        flag,
        then_body: &src[open + 1..close],
        else_body: None,
        end: close + 1,
    };

    let j = scan::skip_ws(src, close + 1);
    if src[j..].starts_with("else") && !bytes.get(j + 4).copied().is_some_and(scan::is_ident_byte) {
        let else_open = scan::skip_ws(src, j + 4);
        if bytes.get(else_open) == Some(&b'{') {
            if let Some(else_close) = scan::find_matching_brace(src, else_open) {
                block.else_body = Some(&src[else_open + 1..else_close]);
                block.end = else_close + 1;
            } else {
                log::warn!("`else` block of `#if {flag}` is never closed; ignored");
            }
        }
    }

    Some(block)
}

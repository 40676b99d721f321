//! Source Formatter
//!
//! Re-indents assembled WGSL by brace depth. Chunk bodies are spliced into
//! templates at arbitrary indentation, so the composed text is normalized in
//! one pass:
//!
//! - every line is trimmed and re-indented to its brace depth
//! - runs of blank lines collapse to one; blank lines directly after `{` or
//!   before `}` are dropped
//! - braces inside comments do not count

#[derive(Debug, Default)]
struct BraceCount {
    opens: usize,
    closes: usize,
    leading_closes: usize,
}

fn count_braces(line: &str, in_block_comment: &mut bool) -> BraceCount {
    let bytes = line.as_bytes();
    let mut count = BraceCount::default();
    let mut seen_code = false;
    let mut i = 0;

    while i < bytes.len() {
        if *in_block_comment {
            if bytes[i..].starts_with(b"*/") {
                *in_block_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        if bytes[i..].starts_with(b"//") {
            break;
        }
        if bytes[i..].starts_with(b"/*") {
            *in_block_comment = true;
            i += 2;
            continue;
        }
        match bytes[i] {
            b'{' => {
                count.opens += 1;
                seen_code = true;
            }
            b'}' => {
                count.closes += 1;
                if !seen_code {
                    count.leading_closes += 1;
                }
            }
            b if b.is_ascii_whitespace() => {}
            _ => seen_code = true,
        }
        i += 1;
    }
    count
}

/// Re-indents `src` using `indent_width` spaces per brace level.
#[must_use]
pub fn format_source(src: &str, indent_width: usize) -> String {
    let mut out = String::with_capacity(src.len());
    let mut depth = 0usize;
    let mut in_block_comment = false;
    let mut blank_pending = false;
    let mut prev_opened = false;

    for line in src.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_pending = !out.is_empty();
            continue;
        }

        let was_in_comment = in_block_comment;
        let braces = count_braces(trimmed, &mut in_block_comment);

        if blank_pending && !prev_opened && braces.leading_closes == 0 {
            out.push('\n');
        }
        blank_pending = false;

        let level = if was_in_comment {
            depth
        } else {
            depth.saturating_sub(braces.leading_closes)
        };
        for _ in 0..level * indent_width {
            out.push(' ');
        }
        out.push_str(trimmed);
        out.push('\n');

        depth = (depth + braces.opens).saturating_sub(braces.closes);
        prev_opened = trimmed.ends_with('{');
    }

    out
}

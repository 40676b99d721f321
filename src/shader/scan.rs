//! Template Scanner
//!
//! Byte-offset helpers shared by the chunk parser and the template passes.
//! Every delimiter the grammar cares about is ASCII, so offsets returned here
//! always sit on `char` boundaries and can be used to slice the source.
//! Loops that step one byte at a time compare on `as_bytes()` and only slice
//! at offsets where an ASCII delimiter matched.

#[inline]
pub(crate) fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Returns the offset of the first non-whitespace byte at or after `i`.
pub(crate) fn skip_ws(src: &str, mut i: usize) -> usize {
    let bytes = src.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Reads an identifier starting at `i`. Returns `None` if none starts there.
pub(crate) fn read_ident(src: &str, i: usize) -> Option<(&str, usize)> {
    let bytes = src.as_bytes();
    let mut end = i;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    (end > i).then(|| (&src[i..end], end))
}

/// If a comment starts at `i`, returns the offset just past it.
///
/// Line comments end after their newline; an unterminated block comment runs
/// to the end of the source.
pub(crate) fn skip_comment(src: &str, i: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    if i + 1 >= bytes.len() || bytes[i] != b'/' {
        return None;
    }
    match bytes[i + 1] {
        b'/' => Some(
            src[i..]
                .find('\n')
                .map_or(bytes.len(), |offset| i + offset + 1),
        ),
        b'*' => Some(
            src[i + 2..]
                .find("*/")
                .map_or(bytes.len(), |offset| i + 2 + offset + 2),
        ),
        _ => None,
    }
}

/// Whether a block comment is still open at the end of `line`, given whether
/// one was open at its start.
pub(crate) fn block_comment_open_after(line: &str, mut open: bool) -> bool {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if open {
            if bytes[i..].starts_with(b"*/") {
                open = false;
                i += 2;
                continue;
            }
        } else if bytes[i..].starts_with(b"//") {
            break;
        } else if bytes[i..].starts_with(b"/*") {
            open = true;
            i += 2;
            continue;
        }
        i += 1;
    }
    open
}

/// Given the offset of a `{`, returns the offset of its matching `}`.
///
/// Braces inside comments are ignored. Returns `None` when unbalanced.
pub(crate) fn find_matching_brace(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    debug_assert_eq!(bytes.get(open), Some(&b'{'));
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_comment(src, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Given the offset just past a `{{`, returns the offset of the closing `}}`.
///
/// Single braces opened inside the body are balanced first, so a body ending
/// in `}` followed by the block's `}}` still terminates at the right place.
pub(crate) fn find_double_close(src: &str, body_start: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut i = body_start;
    while i < bytes.len() {
        if let Some(next) = skip_comment(src, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'{' => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Reads the content of a parenthesized group starting at `i` (which must be `(`).
///
/// Returns the trimmed inner text and the offset just past `)`.
pub(crate) fn read_parens(src: &str, i: usize) -> Option<(&str, usize)> {
    if src.as_bytes().get(i) != Some(&b'(') {
        return None;
    }
    let close = i + src[i..].find(')')?;
    if src[i + 1..close].contains(['\n', '(']) {
        return None;
    }
    Some((src[i + 1..close].trim(), close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_brace_nested() {
        let src = "{ a { b } c }";
        assert_eq!(find_matching_brace(src, 0), Some(src.len() - 1));
        assert_eq!(find_matching_brace(src, 4), Some(8));
    }

    #[test]
    fn test_matching_brace_ignores_comments() {
        let src = "{ // not a { brace\n x; /* } */ }";
        assert_eq!(find_matching_brace(src, 0), Some(src.len() - 1));
    }

    #[test]
    fn test_unbalanced_brace() {
        assert_eq!(find_matching_brace("{ { }", 0), None);
    }

    #[test]
    fn test_double_close_after_inner_scope() {
        let src = "{{ if (a) { b(); }}}";
        let close = find_double_close(src, 2).unwrap();
        assert_eq!(&src[close..], "}}");
    }

    #[test]
    fn test_read_parens() {
        assert_eq!(read_parens("( before:fog ) {{", 0), Some(("before:fog", 14)));
        assert_eq!(read_parens("x", 0), None);
        assert_eq!(read_parens("(unterminated", 0), None);
    }

    #[test]
    fn test_block_comment_state_across_lines() {
        assert!(block_comment_open_after("x(); /* café", false));
        assert!(block_comment_open_after("still inside", true));
        assert!(!block_comment_open_after("ends */ y();", true));
        assert!(!block_comment_open_after("// /* not opened", false));
        assert!(block_comment_open_after("/* a */ /* b", false));
    }

    #[test]
    fn test_read_ident() {
        assert_eq!(read_ident("USE_FOG {", 0), Some(("USE_FOG", 7)));
        assert_eq!(read_ident(" x", 0), None);
    }
}

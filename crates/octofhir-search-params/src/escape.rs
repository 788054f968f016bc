//! Search value escaping helpers (FHIR "Escaping Search Parameters").
//!
//! The characters `$`, `,` and `|` act as separators inside search values.
//! When they appear as data they are prefixed with `\`, which also escapes
//! itself:
//! - `\|` (token system/code separator, quantity parts)
//! - `\$` (composite tuple separator)
//! - `\,` (OR separator)
//! - `\\` (literal backslash)

/// Split `input` on every unescaped occurrence of `sep`.
///
/// A separator is a real delimiter only when it is preceded by an even number
/// of consecutive backslashes. The returned parts keep their escapes; callers
/// run [`unescape`] on the pieces they consume.
///
/// ```
/// use octofhir_search_params::escape::split_unescaped;
///
/// assert_eq!(split_unescaped(r"a\|b|c", b'|'), vec![r"a\|b", "c"]);
/// assert_eq!(split_unescaped("a||b", b'|'), vec!["a", "", "b"]);
/// ```
pub fn split_unescaped(input: &str, sep: u8) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut backslashes = 0usize;

    for (i, &b) in input.as_bytes().iter().enumerate() {
        if b == sep && backslashes % 2 == 0 {
            out.push(&input[start..i]);
            start = i + 1;
        }
        if b == b'\\' {
            backslashes += 1;
        } else {
            backslashes = 0;
        }
    }
    out.push(&input[start..]);
    out
}

/// Resolve the escapes `\\`, `\|`, `\$` and `\,`.
///
/// Backslash pairs are consumed first (left to right), so `\\|` is a literal
/// backslash followed by a bare `|`. Any other backslash, including a trailing
/// one, is passed through unchanged.
pub fn unescape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some(&next @ ('\\' | '|' | '$' | ',')) => {
                out.push(next);
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// Escape the reserved characters of a single value. Inverse of [`unescape`].
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '|' | '$' | ',') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

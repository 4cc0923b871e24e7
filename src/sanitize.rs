// Filename helpers: turn a free-text caption into something that can be
// used as a file name on the remote disk.

/// Characters that are replaced with `_` in a sanitized name.
const FORBIDDEN_CHARS: &[char] = &[' ', '/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Maximum length of a sanitized name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Sanitize a caption into a filesystem-safe name.
///
/// Whitespace (Unicode whitespace plus the ASCII separators `\x1c`..=`\x1f`)
/// is trimmed and collapsed to single spaces first, then every
/// forbidden character (space included) becomes `_`, and finally the result
/// is cut to the first [`MAX_NAME_LEN`] characters.
pub fn sanitize_filename(text: &str) -> String {
    text.split(is_separator)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_NAME_LEN)
        .collect()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

pub(super) const PARAM_START: char = ':';

/// Characters that terminate a placeholder name.
pub(super) const PARAM_ENDS: &[char] = &[' ', ',', '\r', '\n', '(', ')', '"', '\'', '`', '=', '!'];

/// Byte length of the placeholder name at the start of `rest` (the text right after
/// the sentinel). Every boundary is ASCII, so the result is always a char boundary.
pub(super) fn name_len(rest: &str) -> usize {
    rest.find(PARAM_ENDS).unwrap_or(rest.len())
}

/// Split `template` at its next placeholder: the literal text before it, the
/// placeholder name, and the remaining text after the name.
pub(super) fn next_placeholder(template: &str) -> Option<(&str, &str, &str)> {
    let start = template.find(PARAM_START)?;
    let after = &template[start + PARAM_START.len_utf8()..];
    let end = name_len(after);
    Some((&template[..start], &after[..end], &after[end..]))
}

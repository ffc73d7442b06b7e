//! Minimal text cleanup applied to user-submitted content before storage.
//! Deliberately light-handed: strip control characters, keep everything
//! else verbatim so the audit trail stays faithful. HTML escaping is a
//! rendering concern and happens at the edge, not here.

/// Replaces C0 control characters (except `\n` and `\t`) with spaces and
/// trims surrounding whitespace.
pub fn sanitize_text(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                ' '
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

use markcheck_common::Location;

/// A conditional marker found inside a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalComment {
    /// The condition, e.g. `if IE` or `endif`.
    pub expression: String,
    /// Location of the whole marker.
    pub location: Location,
}

/// Length of `(--)?>` at the start of `s`.
fn marker_end(s: &str) -> Option<usize> {
    let dashes = if s.starts_with("--") { 2 } else { 0 };
    s[dashes..].starts_with('>').then_some(dashes + 1)
}

/// Match `<!(--)?[expression](--)?>` at the start of `s`, returning the
/// expression and the marker length.
fn marker(s: &str) -> Option<(&str, usize)> {
    let mut begin = 2;
    if !s.starts_with("<!") {
        return None;
    }
    if s[begin..].starts_with("--") {
        begin += 2;
    }
    let body = s[begin..].strip_prefix('[')?;
    begin += 1;
    for (index, _) in body.match_indices(']') {
        if body[..index].contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
            return None;
        }
        if let Some(end) = marker_end(&body[index + 1..]) {
            return Some((&body[..index], begin + index + 1 + end));
        }
    }
    None
}

/// Find IE conditional markers (`<!--[if IE]>`, `<![endif]-->`, ...) in the
/// text of a comment token located at `location`.
#[must_use]
pub fn parse_conditional_comment(comment: &str, location: &Location) -> Vec<ConditionalComment> {
    let mut found = Vec::new();
    let mut offset = 0;
    while let Some(start) = comment[offset..].find("<!").map(|i| offset + i) {
        match marker(&comment[start..]) {
            Some((expression, len)) => {
                found.push(ConditionalComment {
                    expression: expression.to_string(),
                    location: location.slice(comment, start, Some(start + len)),
                });
                offset = start + len;
            }
            None => offset = start + 2,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_both_markers() {
        let comment = "<!--[if IE 6]><p>old</p><![endif]-->";
        let found = parse_conditional_comment(comment, &Location::start_of("inline"));
        let expressions: Vec<_> = found.iter().map(|c| c.expression.as_str()).collect();
        assert_eq!(expressions, vec!["if IE 6", "endif"]);
        assert_eq!(found[0].location.column, 1);
        assert_eq!(found[0].location.size, 14);
        assert_eq!(found[1].location.offset, 24);
    }

    #[test]
    fn test_plain_comment_has_no_markers() {
        assert!(parse_conditional_comment("<!-- just a note -->", &Location::start_of("inline")).is_empty());
    }
}

//! Pattern matchers.
//!
//! Each matcher tests the start of the remaining input and returns the
//! matched slice followed by its captures, or `None`. Matchers never look
//! behind their input and never allocate beyond the returned vector.
//!
//! `.` in the descriptions below means any character except a line
//! terminator.

/// Matched text followed by captures.
pub type Captures<'a> = Vec<&'a str>;

/// A matcher over the remaining input.
pub type Matcher = for<'a> fn(&'a str) -> Option<Captures<'a>>;

const DIRECTIVE_PREFIX: &str = "[html-validate-";

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn newline_len(s: &str) -> usize {
    if s.starts_with("\r\n") {
        2
    } else if s.starts_with(['\r', '\n']) {
        1
    } else {
        0
    }
}

fn blank_len(s: &str) -> usize {
    s.bytes().take_while(|b| matches!(b, b' ' | b'\t')).count()
}

fn space_len(s: &str) -> usize {
    s.chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum()
}

/// Length of `open` + `.*?` + `close`, if present.
fn delimited(s: &str, open: &str, close: &str) -> Option<usize> {
    let rest = s.strip_prefix(open)?;
    let end = rest.find(close)?;
    if rest[..end].contains(is_line_terminator) {
        return None;
    }
    Some(open.len() + end + close.len())
}

/// A line break, or spaces/tabs optionally followed by a line break.
pub fn whitespace(s: &str) -> Option<Captures<'_>> {
    let newline = newline_len(s);
    if newline > 0 {
        return Some(vec![&s[..newline]]);
    }
    let blanks = blank_len(s);
    if blanks == 0 {
        return None;
    }
    let len = blanks + newline_len(&s[blanks..]);
    Some(vec![&s[..len]])
}

/// `<?xml ... ?>` followed by a newline.
pub fn xml_tag(s: &str) -> Option<Captures<'_>> {
    let len = delimited(s, "<?xml", "?>\n")?;
    Some(vec![&s[..len]])
}

/// `<!DOCTYPE` or `<!doctype` followed by one whitespace character.
pub fn doctype_open(s: &str) -> Option<Captures<'_>> {
    let rest = s
        .strip_prefix("<!DOCTYPE")
        .or_else(|| s.strip_prefix("<!doctype"))?;
    let c = rest.chars().next().filter(|c| c.is_whitespace())?;
    Some(vec![&s[..9 + c.len_utf8()]])
}

/// Everything up to the next `>` (at least one character).
pub fn doctype_value(s: &str) -> Option<Captures<'_>> {
    let len = s.find('>').unwrap_or(s.len());
    (len > 0).then(|| vec![&s[..len]])
}

/// `>`.
pub fn doctype_close(s: &str) -> Option<Captures<'_>> {
    s.starts_with('>').then(|| vec![&s[..1]])
}

/// `<name` or `</name` where the name is ASCII alphanumerics, `-` and `:`.
pub fn tag_open(s: &str) -> Option<Captures<'_>> {
    let rest = s.strip_prefix('<')?;
    let slash = usize::from(rest.starts_with('/'));
    let name_len = rest[slash..]
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b':'))
        .count();
    if name_len == 0 {
        return None;
    }
    let end = 1 + slash + name_len;
    Some(vec![&s[..end], &s[1..=slash], &s[1 + slash..end]])
}

/// `>` or `/>`.
pub fn tag_close(s: &str) -> Option<Captures<'_>> {
    if s.starts_with("/>") {
        Some(vec![&s[..2]])
    } else if s.starts_with('>') {
        Some(vec![&s[..1]])
    } else {
        None
    }
}

/// Whether a text run stops at the start of `s`: before blanks ending a line,
/// before `<` followed by anything but a space, or at the end of input.
fn text_boundary(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if newline_len(&s[blank_len(s)..]) > 0 {
        return true;
    }
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c != ' ')
}

/// Character data up to the next text boundary.
///
/// Always consumes at least one character, so a `<` that starts no markup
/// becomes text.
pub fn text(s: &str) -> Option<Captures<'_>> {
    let mut len = s.chars().next()?.len_utf8();
    while !text_boundary(&s[len..]) {
        len += s[len..].chars().next().map_or(1, char::len_utf8);
    }
    Some(vec![&s[..len]])
}

/// `<% ... %>`, `<? ... ?>` or `<$ ... $>` on a single line.
pub fn templating(s: &str) -> Option<Captures<'_>> {
    let len = delimited(s, "<%", "%>")
        .or_else(|| delimited(s, "<?", "?>"))
        .or_else(|| delimited(s, "<$", "$>"))?;
    Some(vec![&s[..len]])
}

/// An attribute name: anything but whitespace, `/`, `>`, `<`, quotes and `=`.
pub fn attr_start(s: &str) -> Option<Captures<'_>> {
    let len: usize = s
        .chars()
        .take_while(|c| !matches!(c, '\t' | '\r' | '\n' | '\u{c}' | ' ' | '/' | '>' | '<' | '"' | '\'' | '='))
        .map(char::len_utf8)
        .sum();
    (len > 0).then(|| vec![&s[..len], &s[..len]])
}

/// Offset just past `\s*=\s*`.
fn assignment(s: &str) -> Option<usize> {
    let before = space_len(s);
    let rest = s[before..].strip_prefix('=')?;
    Some(before + 1 + space_len(rest))
}

fn attr_quoted(s: &str, quote: char) -> Option<Captures<'_>> {
    let start = assignment(s)?;
    let rest = s[start..].strip_prefix(quote)?;
    let len = rest.find(quote)?;
    let value_start = start + 1;
    let end = value_start + len;
    Some(vec![&s[..=end], &s[value_start..end], &s[end..=end]])
}

/// `='value'`, with whitespace allowed around `=`.
pub fn attr_single(s: &str) -> Option<Captures<'_>> {
    attr_quoted(s, '\'')
}

/// `="value"`, with whitespace allowed around `=`.
pub fn attr_double(s: &str) -> Option<Captures<'_>> {
    attr_quoted(s, '"')
}

/// `=value` without quotes.
pub fn attr_unquoted(s: &str) -> Option<Captures<'_>> {
    let start = assignment(s)?;
    let rest = &s[start..];
    let first = rest.chars().next()?;
    if matches!(first, '\t' | '\r' | '\n' | '\u{c}' | ' ' | '"' | '\'' | '<' | '>') {
        return None;
    }
    let len: usize = rest
        .chars()
        .take_while(|c| !matches!(c, '\t' | '\r' | '\n' | '\u{c}' | ' ' | '<' | '>'))
        .map(char::len_utf8)
        .sum();
    let end = start + len;
    Some(vec![&s[..end], &s[start..end]])
}

/// `<![CDATA[`.
pub fn cdata_begin(s: &str) -> Option<Captures<'_>> {
    s.starts_with("<![CDATA[").then(|| vec![&s[..9]])
}

/// Everything up to and including `]]>`.
pub fn cdata_end(s: &str) -> Option<Captures<'_>> {
    let end = s.find("]]>")? + 3;
    Some(vec![&s[..end]])
}

/// Everything up to (not including) `</script`.
pub fn script_data(s: &str) -> Option<Captures<'_>> {
    let len = s.find("</script")?;
    Some(vec![&s[..len]])
}

/// `</script`.
pub fn script_end(s: &str) -> Option<Captures<'_>> {
    s.starts_with("</script")
        .then(|| vec![&s[..8], &s[1..2], &s[2..8]])
}

/// `<!-- [html-validate-...] -->` with exactly one whitespace character on
/// each side of the brackets.
pub fn directive(s: &str) -> Option<Captures<'_>> {
    let rest = s.strip_prefix("<!--")?;
    let c = rest.chars().next().filter(|c| c.is_whitespace())?;
    let body_start = 4 + c.len_utf8() + DIRECTIVE_PREFIX.len();
    if !s[4 + c.len_utf8()..].starts_with(DIRECTIVE_PREFIX) {
        return None;
    }
    let body = &s[body_start..];
    for (index, bracket) in body.match_indices(']') {
        if body[..index].contains(is_line_terminator) {
            return None;
        }
        let after = &body[index + bracket.len()..];
        let Some(ws) = after.chars().next().filter(|c| c.is_whitespace()) else {
            continue;
        };
        if after[ws.len_utf8()..].starts_with("-->") {
            let end = body_start + index + 1 + ws.len_utf8() + 3;
            return Some(vec![&s[..end], &body[..index]]);
        }
    }
    None
}

/// `<!-- ... -->`, possibly spanning lines.
pub fn comment(s: &str) -> Option<Captures<'_>> {
    let rest = s.strip_prefix("<!--")?;
    let len = rest.find("-->")?;
    Some(vec![&s[..4 + len + 3], &rest[..len]])
}

/// `<![condition]>` where the condition contains no `]`.
pub fn conditional(s: &str) -> Option<Captures<'_>> {
    let rest = s.strip_prefix("<![")?;
    let len = rest.find(']')?;
    if !rest[len + 1..].starts_with('>') {
        return None;
    }
    Some(vec![&s[..3 + len + 2], &rest[..len]])
}

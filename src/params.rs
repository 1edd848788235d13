use std::collections::HashMap;

/// Parses `name=value` pairs such as the parameters of a `Content-Disposition`
/// header value.
///
/// The pairs are split on whichever of `separators` occurs first in `text`.
/// Names and values are trimmed, surrounding quotes are stripped from values
/// and separators inside quotes are kept. A name without `=` maps to `None`,
/// as does an empty value. Later duplicates win.
pub fn parse_params(text: &str, separators: &[char], lower_case_names: bool) -> HashMap<String, Option<String>> {
    let separator = match separators
        .iter()
        .filter_map(|&sep| text.find(sep).map(|idx| (idx, sep)))
        .min()
    {
        Some((_, sep)) => sep,
        None => match separators.first() {
            Some(&sep) => sep,
            None => return HashMap::new(),
        },
    };

    let mut params = HashMap::new();
    let mut rest = text;

    while !rest.is_empty() {
        let name_end = rest.find(|ch: char| ch == '=' || ch == separator).unwrap_or_else(|| rest.len());
        let name = rest[..name_end].trim();
        rest = &rest[name_end..];

        let mut value = None;
        if rest.starts_with('=') {
            let (raw, tail) = split_quoted(&rest[1..], separator);
            value = unquote(raw.trim());
            rest = tail;
        }

        if rest.starts_with(separator) {
            rest = &rest[separator.len_utf8()..];
        }

        if !name.is_empty() {
            let name = if lower_case_names {
                name.to_lowercase()
            } else {
                name.to_owned()
            };
            params.insert(name, value);
        }
    }

    params
}

/// Splits at the first `separator` that is not inside a quoted string.
fn split_quoted(text: &str, separator: char) -> (&str, &str) {
    let mut quoted = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if !quoted && ch == separator {
            return (&text[..idx], &text[idx..]);
        }

        if !escaped && ch == '"' {
            quoted = !quoted;
        }
        escaped = !escaped && ch == '\\';
    }

    (text, "")
}

fn unquote(value: &str) -> Option<String> {
    let value = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    };

    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

use super::types::ValidationMode;

const ATEXT_SPECIALS: &[char] = &[
    '!', '#', '$', '%', '&', '\'', '*', '+', '-', '/', '=', '?', '^', '_', '`', '{', '|', '}', '~',
];

/// Checks the local part against `mode`; `None` when it is acceptable.
pub(crate) fn local_part_reason(local: &str, mode: ValidationMode) -> Option<String> {
    if local.is_empty() || local.len() > 64 {
        return Some(format!(
            "local part length {} invalid (1..=64)",
            local.len()
        ));
    }
    let ok = match mode {
        ValidationMode::Strict => is_dot_atom(local),
        ValidationMode::Relaxed => is_quoted_string(local) || is_dot_atom(local),
    };
    if ok {
        None
    } else {
        Some(match mode {
            ValidationMode::Strict => "invalid local part (strict rules)".into(),
            ValidationMode::Relaxed => "invalid local part (relaxed rules)".into(),
        })
    }
}

/// atext ASCII + '.' non initial/terminal, pas de ".."
fn is_dot_atom(s: &str) -> bool {
    if s.starts_with('.') || s.ends_with('.') || s.contains("..") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || ATEXT_SPECIALS.contains(&c))
}

/// quoted-string simple: printable ASCII, `\` escapes the next char.
fn is_quoted_string(s: &str) -> bool {
    let Some(inner) = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return false;
    };
    let mut escaped = false;
    for c in inner.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return false,
            c if c == ' ' || c.is_ascii_graphic() => {}
            _ => return false,
        }
    }
    !escaped
}

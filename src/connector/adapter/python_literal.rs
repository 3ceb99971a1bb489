//! Python string literal decoding and docstring cleanup.

/// Value of a single Python string literal as written in source.
///
/// Returns `None` for bytes (`b"..."`) and formatted (`f"..."`) literals,
/// which are not string constants.
pub fn string_literal_value(literal: &str) -> Option<String> {
    let prefix_len = literal
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();
    let prefix = literal[..prefix_len].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') || prefix.contains('t') {
        return None;
    }

    let quoted = &literal[prefix_len..];
    let quote_len = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
        3
    } else {
        1
    };
    if quoted.len() < quote_len * 2 {
        return None;
    }

    let body = quoted[quote_len..quoted.len() - quote_len].replace("\r\n", "\n");
    if prefix.contains('r') {
        Some(body)
    } else {
        Some(unescape(&body))
    }
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            None => out.push('\\'),
            Some('\n') => {}
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some(first @ '0'..='7') => {
                let mut value = first.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            value = value * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            Some(marker @ ('x' | 'u' | 'U')) => {
                let width = match marker {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut digits = String::new();
                while digits.len() < width {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            digits.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push(marker);
                        out.push_str(&digits);
                    }
                }
            }
            Some('N') if chars.peek() == Some(&'{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                match closed.then(|| unicode_names2::character(&name)).flatten() {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push_str("\\N{");
                        out.push_str(&name);
                        if closed {
                            out.push('}');
                        }
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

/// Normalizes docstring indentation the way `inspect.cleandoc` does.
pub fn clean_docstring(doc: &str) -> String {
    let expanded: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = expanded
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start();
            (!content.is_empty())
                .then(|| line.chars().count() - content.chars().count())
        })
        .min();

    let mut lines: Vec<String> = Vec::with_capacity(expanded.len());
    for (i, line) in expanded.iter().enumerate() {
        if i == 0 {
            lines.push(line.trim_start().to_string());
        } else if let Some(margin) = margin {
            lines.push(line.chars().skip(margin).collect());
        } else {
            lines.push(line.clone());
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_empty()).count();

    lines[leading..].join("\n")
}

fn expand_tabs(line: &str) -> String {
    const TAB_SIZE: usize = 8;
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = TAB_SIZE - column % TAB_SIZE;
            out.extend(std::iter::repeat(' ').take(spaces));
            column += spaces;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

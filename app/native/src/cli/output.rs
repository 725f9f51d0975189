//! CLI output formatting.

use colored::Colorize;

/// Prints JSON with syntax highlighting.
///
/// Keys are cyan, strings green, numbers yellow, booleans and null magenta.
pub fn print_highlighted_json(value: &serde_json::Value) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    println!("{}", highlight_json(&json));
}

/// Colors a pretty-printed JSON document.
#[must_use]
pub fn highlight_json(json: &str) -> String {
    let mut out = String::with_capacity(json.len() * 2);
    let mut token = String::new();
    let mut in_string = false;
    let mut escape_next = false;
    let mut after_colon = false;
    let mut open: Vec<char> = Vec::new();

    for ch in json.chars() {
        if in_string {
            token.push(ch);
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                let painted = if after_colon { token.green() } else { token.cyan() };
                out.push_str(&painted.to_string());
                token.clear();
                in_string = false;
                after_colon = false;
            }
            continue;
        }

        match ch {
            '"' => {
                push_scalar(&mut out, &mut token);
                token.push(ch);
                in_string = true;
            }
            ':' => {
                push_scalar(&mut out, &mut token);
                out.push(':');
                after_colon = true;
            }
            ',' | '{' | '}' | '[' | ']' => {
                push_scalar(&mut out, &mut token);
                out.push_str(&ch.to_string().bold().to_string());
                match ch {
                    '{' | '[' => open.push(ch),
                    '}' | ']' => {
                        open.pop();
                    }
                    _ => {}
                }
                // Array elements are values too.
                after_colon = open.last() == Some(&'[');
            }
            _ => token.push(ch),
        }
    }

    push_scalar(&mut out, &mut token);
    out
}

/// Flushes a bare token, coloring numbers and literals.
fn push_scalar(out: &mut String, token: &mut String) {
    if token.is_empty() {
        return;
    }

    let start = token.find(|c: char| !c.is_whitespace()).unwrap_or(token.len());
    let end = token.rfind(|c: char| !c.is_whitespace()).map_or(start, |i| i + 1);
    let (prefix, rest) = token.split_at(start);
    let (value, suffix) = rest.split_at(end - start);

    out.push_str(prefix);
    if matches!(value, "true" | "false" | "null") {
        out.push_str(&value.magenta().to_string());
    } else if value.parse::<f64>().is_ok() {
        out.push_str(&value.yellow().to_string());
    } else {
        out.push_str(value);
    }
    out.push_str(suffix);
    token.clear();
}

/// Truncates to `max_chars` characters, adding an ellipsis if needed.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }

    let cut = s.char_indices().nth(max_chars - 1).map_or(s.len(), |(idx, _)| idx);
    format!("{}…", &s[..cut])
}

/// Formats a boolean as a colored check mark or cross.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "✓".green().to_string() } else { "✗".red().to_string() }
}

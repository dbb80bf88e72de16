//! Text scrubbing shared by the line-protocol and CSV serializers.

/// Make text safe for a line-protocol measurement, tag, or field key.
///
/// Spaces and line breaks are dropped, commas become dots, and `=` is
/// backslash-escaped.
pub fn sanitize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            ' ' | '\n' | '\r' => {}
            ',' => out.push('.'),
            '=' => out.push_str("\\="),
            other => out.push(other),
        }
    }
    out
}

/// Whether a raw value can be written as an unquoted line-protocol number.
///
/// Non-finite values (`NaN`, `inf`) parse in Rust but are rejected by
/// line-protocol readers, so they stay strings.
pub fn is_numeric(raw: &str) -> bool {
    raw.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Format a raw value for the field position of a line-protocol line.
pub fn format_field_value(raw: &str) -> String {
    if is_numeric(raw) {
        return raw.to_string();
    }
    let clean = sanitize(raw).replace("\\=", "=");
    let mut out = String::with_capacity(clean.len() + 2);
    out.push('"');
    for ch in clean.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Replace every `delimiter` in a CSV field with `replacement`.
///
/// Line breaks become spaces so one point always stays one row.
pub fn scrub_csv_field(field: &str, delimiter: char, replacement: char) -> String {
    field
        .chars()
        .map(|ch| match ch {
            c if c == delimiter => replacement,
            '\n' | '\r' => ' ',
            c => c,
        })
        .collect()
}

//! Name normalization shared by fields, structs and the protocol.

/// Canonical identifier form of a name taken from a document.
///
/// Runs of whitespace and punctuation become a single `_`, leading/trailing
/// separators are dropped and case is preserved: `"Source  Port"` → `"Source_Port"`,
/// `"Data-Offset."` → `"Data_Offset"`. A leading digit gets a `_` prefix so the result
/// stays a valid identifier.
pub fn field_name_formatter(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

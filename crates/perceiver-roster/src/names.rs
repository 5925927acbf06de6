/// Turn a roster display name into its canonical "First Last" form.
///
/// Only names with exactly one comma and text on both sides are reordered;
/// anything else passes through with whitespace collapsed. Applying the
/// function to its own output is a no-op.
pub fn canonicalize(raw: &str) -> String {
    let normalized = collapse_whitespace(raw);
    let mut parts = normalized.split(',');
    if let (Some(last), Some(first), None) = (parts.next(), parts.next(), parts.next()) {
        let (last, first) = (last.trim(), first.trim());
        if !last.is_empty() && !first.is_empty() {
            return format!("{first} {last}");
        }
    }
    normalized
}

/// Comparison key for a name in any accepted form.
pub fn name_key(raw: &str) -> String {
    canonicalize(raw).to_lowercase()
}

pub fn same_person(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

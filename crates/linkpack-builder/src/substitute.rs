//! Placeholder substitution.

use std::collections::{BTreeMap, BTreeSet};

use linkpack_common::constants::{PLACEHOLDER_OPEN, placeholder};

/// Replaces every `{{variable}}` occurrence in `content` with the bytes
/// mapped to `variable`.
///
/// The scan is a single left-to-right pass: inserted bytes are never
/// scanned again, so a descriptor that happens to contain placeholder
/// syntax cannot trigger a second substitution. When placeholders overlap,
/// the longest one wins. Unknown placeholders are copied through.
///
/// Returns the new content and the variables that were found at least once.
pub fn substitute<'a>(
    content: &[u8],
    replacements: &'a BTreeMap<String, Vec<u8>>,
) -> (Vec<u8>, BTreeSet<&'a str>) {
    let mut patterns: Vec<(Vec<u8>, &str, &[u8])> = replacements
        .iter()
        .map(|(variable, bytes)| {
            (
                placeholder(variable).into_bytes(),
                variable.as_str(),
                bytes.as_slice(),
            )
        })
        .collect();
    patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.1.cmp(b.1)));

    let open = PLACEHOLDER_OPEN.as_bytes();
    let mut out = Vec::with_capacity(content.len());
    let mut used = BTreeSet::new();
    let mut i = 0;
    while i < content.len() {
        let rest = &content[i..];
        if rest.starts_with(open) {
            if let Some((pattern, variable, bytes)) =
                patterns.iter().find(|(pattern, _, _)| rest.starts_with(pattern))
            {
                out.extend_from_slice(bytes);
                let _ = used.insert(*variable);
                i += pattern.len();
                continue;
            }
        }
        out.push(content[i]);
        i += 1;
    }
    (out, used)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn replaces_every_occurrence() {
        let replacements = map(&[("/x", "1")]);
        let (out, used) = substitute(b"{{/x}}-{{/x}}", &replacements);
        assert_eq!(out, b"1-1");
        assert!(used.contains("/x"));
    }

    #[test]
    fn unknown_placeholders_are_copied() {
        let replacements = map(&[("/x", "1")]);
        let (out, used) = substitute(b"{{/y}} {{", &replacements);
        assert_eq!(out, b"{{/y}} {{");
        assert!(used.is_empty());
    }

    #[test]
    fn inserted_bytes_are_not_rescanned() {
        let replacements = map(&[("/a", "{{/b}}"), ("/b", "B")]);
        let (out, _) = substitute(b"{{/a}}", &replacements);
        assert_eq!(out, b"{{/b}}");
    }

    #[test]
    fn longest_placeholder_wins() {
        let replacements = map(&[("/a", "short"), ("/a}}x{{", "long")]);
        let (out, _) = substitute(b"{{/a}}x{{}}", &replacements);
        assert_eq!(out, b"long");
    }
}

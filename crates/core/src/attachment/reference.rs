//! Attachment reference normalization.
//!
//! Owning records store references as bare identifiers, relative paths, or
//! absolute URLs. Every shape reduces to the identifier in its last
//! non-empty path segment.

/// Extract the blob identifier from a stored reference.
///
/// Strips any fragment and query, then takes the last non-empty path
/// segment. Input that yields no segment is returned trimmed as an opaque
/// identifier; this function never fails and is idempotent.
#[must_use]
pub fn extract_reference_id(reference: &str) -> String {
    let trimmed = reference.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);

    without_query
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::bare_id("abc123", "abc123")]
    #[case::relative_path("/api/photos/abc123", "abc123")]
    #[case::absolute_url_with_query("https://host/api/photos/abc123?x=1", "abc123")]
    #[case::fragment_stripped("/api/photos/abc123#top", "abc123")]
    #[case::trailing_slash("/api/photos/abc123/", "abc123")]
    #[case::whitespace_trimmed("  abc123  ", "abc123")]
    fn test_reference_shapes(#[case] reference: &str, #[case] expected: &str) {
        assert_eq!(extract_reference_id(reference), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_slashes("///")]
    #[case::only_query("?x=1")]
    fn test_degenerate_input_is_opaque(#[case] reference: &str) {
        assert_eq!(extract_reference_id(reference), reference);
    }
}

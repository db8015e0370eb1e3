//! Tag entity.

/// A tag together with the number of short URLs carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    pub short_urls_count: i64,
}

/// Normalizes a list of tag names: trims, drops blanks and duplicates, keeps first-seen order.
///
/// Names are case-sensitive.
pub fn normalize_tag_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result: Vec<String> = Vec::new();

    for name in names {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() || result.iter().any(|n| n == trimmed) {
            continue;
        }
        result.push(trimmed.to_string());
    }

    result
}

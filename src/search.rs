use crate::apis::PaperRecord;

/// Keep papers with at least one author whose name contains `name`,
/// case-insensitively.
pub fn filter_by_author(records: Vec<PaperRecord>, name: &str) -> Vec<PaperRecord> {
    let needle = name.to_lowercase();
    records
        .into_iter()
        .filter(|r| r.authors.iter().any(|a| a.to_lowercase().contains(&needle)))
        .collect()
}

/// Keep papers whose title contains `needle`, case-insensitively.
pub fn filter_by_title(records: Vec<PaperRecord>, needle: &str) -> Vec<PaperRecord> {
    let needle = needle.to_lowercase();
    records
        .into_iter()
        .filter(|r| r.title.to_lowercase().contains(&needle))
        .collect()
}

/// Reorder by how often `keyword` appears in the abstract, most hits first.
/// The sort is stable, so equally ranked papers keep their date order.
pub fn rank_by_keyword(mut records: Vec<PaperRecord>, keyword: &str) -> Vec<PaperRecord> {
    let needle = keyword.to_lowercase();
    records.sort_by_cached_key(|r| std::cmp::Reverse(keyword_count(&r.summary, &needle)));
    records
}

fn keyword_count(text: &str, needle_lower: &str) -> usize {
    if needle_lower.is_empty() {
        return 0;
    }
    text.to_lowercase().matches(needle_lower).count()
}

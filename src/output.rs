use crate::apis::PaperRecord;

/// Render records as human-readable blocks, one per paper.
pub fn render_text(records: &[PaperRecord], preview_chars: usize) -> String {
    let mut out = String::new();
    for r in records {
        out.push_str(&format!("Title: {}\n", r.title));
        out.push_str(&format!("Authors: {}\n", r.authors.join(", ")));
        out.push_str(&format!("Abstract: {}\n", r.preview(preview_chars)));
        if let Some(published) = r.published {
            out.push_str(&format!("Published: {}\n", published.format("%Y-%m-%d")));
        }
        out.push_str(&format!("PDF: {}\n", r.pdf_link));
        out.push_str(&"=".repeat(50));
        out.push('\n');
    }
    out
}

pub fn render_json(records: &[PaperRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

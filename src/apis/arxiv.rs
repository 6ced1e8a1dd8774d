use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{PaperRecord, SourceError};

const BASE_URL: &str = "https://export.arxiv.org/api/query";
const USER_AGENT: &str = concat!("arxiv-search/", env!("CARGO_PKG_VERSION"));

/// Parameters of one arXiv API request.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub keyword: String,
    pub max_results: u32,
}

impl QuerySpec {
    pub fn new(keyword: &str, max_results: u32) -> Self {
        Self {
            keyword: keyword.trim().to_string(),
            max_results,
        }
    }

    /// Full request URL. The API is asked to sort by submission date, but
    /// the parser re-sorts anyway so a partially ordered feed cannot leak
    /// through.
    pub fn to_url(&self) -> String {
        format!(
            "{}?search_query=all:{}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            BASE_URL,
            urlencoded(&self.keyword),
            self.max_results
        )
    }
}

fn urlencoded(s: &str) -> String {
    s.replace(' ', "+")
        .replace(':', "%3A")
        .replace('/', "%2F")
}

pub struct ArxivClient {
    client: reqwest::Client,
}

impl ArxivClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap(),
        }
    }

    /// Issue one GET for the query and parse the response feed.
    pub async fn search(&self, spec: &QuerySpec) -> Result<Vec<PaperRecord>, SourceError> {
        let url = spec.to_url();
        tracing::debug!("GET {}", url);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Api(format!("arXiv returned HTTP {}", status)));
        }
        let body = resp.text().await?;
        parse_feed(&body, spec.max_results as usize)
    }
}

/// Map the Atom feed into records: most recently published first, stable on
/// ties (feed order), truncated to `max_results`. Undated entries sort last.
///
/// Malformed XML and documents without an Atom `feed` root are `Parse`
/// errors; a well-formed feed with zero entries is an empty result.
pub fn parse_feed(xml: &str, max_results: usize) -> Result<Vec<PaperRecord>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut records: Vec<PaperRecord> = Vec::new();
    let mut saw_feed = false;
    let mut in_entry = false;
    let mut in_author = false;
    let mut current_tag = String::new();
    let mut title = String::new();
    let mut summary = String::new();
    let mut published_raw = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut author_name = String::new();
    let mut pdf_link = String::new();
    let mut first_link = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if tag == "feed" {
                    saw_feed = true;
                } else if tag == "entry" {
                    in_entry = true;
                    title.clear();
                    summary.clear();
                    published_raw.clear();
                    authors.clear();
                    pdf_link.clear();
                    first_link.clear();
                } else if in_entry {
                    current_tag = tag;
                    if current_tag == "author" {
                        in_author = true;
                        author_name.clear();
                    } else if current_tag == "link" {
                        record_link(&e, &mut pdf_link, &mut first_link)?;
                    }
                }
            }
            Ok(Event::Empty(e)) if in_entry => {
                if e.local_name().as_ref() == b"link" {
                    record_link(&e, &mut pdf_link, &mut first_link)?;
                }
            }
            Ok(Event::Text(e)) if in_entry => {
                let text = e
                    .unescape()
                    .map_err(|err| SourceError::Parse(format!("bad text content: {}", err)))?;
                match current_tag.as_str() {
                    "title" => title.push_str(&text),
                    "summary" => summary.push_str(&text),
                    "published" => published_raw.push_str(&text),
                    "name" if in_author => author_name.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if tag == "entry" && in_entry {
                    in_entry = false;
                    records.push(PaperRecord {
                        title: normalize_ws(&title),
                        authors: authors.clone(),
                        summary: normalize_ws(&summary),
                        pdf_link: if pdf_link.is_empty() {
                            first_link.clone()
                        } else {
                            pdf_link.clone()
                        },
                        published: parse_published(&published_raw)?,
                    });
                } else if tag == "author" && in_author {
                    in_author = false;
                    let name = author_name.trim();
                    if !name.is_empty() {
                        authors.push(name.to_string());
                    }
                }
                if tag == current_tag {
                    current_tag.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SourceError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
        buf.clear();
    }

    if !saw_feed {
        return Err(SourceError::Parse("response is not an Atom feed".into()));
    }

    // Vec::sort_by is stable, so equally dated entries keep feed order.
    records.sort_by(|a, b| b.published.cmp(&a.published));
    records.truncate(max_results);
    Ok(records)
}

/// Track the PDF rendition link (`title="pdf"` or `type="application/pdf"`)
/// and the first link of the entry as a fallback.
fn record_link(
    e: &BytesStart,
    pdf_link: &mut String,
    first_link: &mut String,
) -> Result<(), SourceError> {
    let mut href = String::new();
    let mut is_pdf = false;
    for attr in e.attributes() {
        let attr =
            attr.map_err(|err| SourceError::Parse(format!("bad link attribute: {}", err)))?;
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"href" => href = value,
            b"title" if value == "pdf" => is_pdf = true,
            b"type" if value == "application/pdf" => is_pdf = true,
            _ => {}
        }
    }
    if first_link.is_empty() {
        *first_link = href.clone();
    }
    if is_pdf {
        *pdf_link = href;
    }
    Ok(())
}

/// Collapse runs of whitespace; arXiv wraps titles and abstracts with
/// newline + indent.
fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_published(raw: &str) -> Result<Option<DateTime<Utc>>, SourceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|err| SourceError::Parse(format!("bad published timestamp {:?}: {}", raw, err)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: search_query=all:electron</title>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <title>Oldest Paper
  on Electron Transport</title>
    <summary>
      Electron transport in disordered media.
    </summary>
    <published>2024-01-01T00:00:00Z</published>
    <author><name>Ada Lovelace</name></author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link href="http://arxiv.org/pdf/2401.00001v1" title="pdf" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2403.00003v1</id>
    <title>Newest Paper</title>
    <summary>Most recent submission.</summary>
    <published>2024-03-01T00:00:00Z</published>
    <author><name>Grace Hopper</name></author>
    <author><name>Annie Easley</name></author>
    <link href="http://arxiv.org/abs/2403.00003v1" rel="alternate" type="text/html"/>
    <link href="http://arxiv.org/pdf/2403.00003v1" title="pdf" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2402.00002v1</id>
    <title>Middle Paper</title>
    <summary>No pdf link on this one.</summary>
    <published>2024-02-01T00:00:00Z</published>
    <author><name>Katherine Johnson</name></author>
    <link href="http://arxiv.org/abs/2402.00002v1" rel="alternate" type="text/html"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_entry_fields() {
        let records = parse_feed(SAMPLE_ATOM, 10).unwrap();
        assert_eq!(records.len(), 3);
        let newest = &records[0];
        assert_eq!(newest.title, "Newest Paper");
        assert_eq!(newest.authors, vec!["Grace Hopper", "Annie Easley"]);
        assert_eq!(newest.summary, "Most recent submission.");
        assert_eq!(newest.pdf_link, "http://arxiv.org/pdf/2403.00003v1");
    }

    #[test]
    fn normalizes_wrapped_title_and_summary() {
        let records = parse_feed(SAMPLE_ATOM, 10).unwrap();
        let oldest = records.last().unwrap();
        assert_eq!(oldest.title, "Oldest Paper on Electron Transport");
        assert_eq!(oldest.summary, "Electron transport in disordered media.");
    }

    #[test]
    fn sorts_by_published_descending_and_truncates() {
        let records = parse_feed(SAMPLE_ATOM, 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Newest Paper");
        assert_eq!(records[1].title, "Middle Paper");
    }

    #[test]
    fn returns_all_entries_when_feed_is_shorter_than_max() {
        let records = parse_feed(SAMPLE_ATOM, 100).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn falls_back_to_first_link_without_pdf_rendition() {
        let records = parse_feed(SAMPLE_ATOM, 10).unwrap();
        let middle = &records[1];
        assert_eq!(middle.pdf_link, "http://arxiv.org/abs/2402.00002v1");
    }

    #[test]
    fn equal_dates_keep_feed_order() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>First</title><published>2024-05-01T00:00:00Z</published></entry>
  <entry><title>Second</title><published>2024-05-01T00:00:00Z</published></entry>
</feed>"#;
        let records = parse_feed(feed, 10).unwrap();
        assert_eq!(records[0].title, "First");
        assert_eq!(records[1].title, "Second");
    }

    #[test]
    fn undated_entries_sort_last() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>Undated</title></entry>
  <entry><title>Dated</title><published>2020-01-01T00:00:00Z</published></entry>
</feed>"#;
        let records = parse_feed(feed, 10).unwrap();
        assert_eq!(records[0].title, "Dated");
        assert_eq!(records[1].title, "Undated");
        assert!(records[1].published.is_none());
    }

    #[test]
    fn empty_feed_is_not_an_error() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;
        assert!(parse_feed(feed, 10).unwrap().is_empty());
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let result = parse_feed("<feed><entry></wrong></entry></feed>", 10);
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn non_atom_body_is_a_parse_error() {
        let result = parse_feed("service unavailable", 10);
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn bad_timestamp_is_a_parse_error() {
        let feed = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>Bad date</title><published>yesterday</published></entry>
</feed>"#;
        let result = parse_feed(feed, 10);
        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    #[test]
    fn query_url_escapes_keyword() {
        let spec = QuerySpec::new("  quantum field theory ", 5);
        assert_eq!(
            spec.to_url(),
            "https://export.arxiv.org/api/query?search_query=all:quantum+field+theory\
             &start=0&max_results=5&sortBy=submittedDate&sortOrder=descending"
        );
    }

    #[test]
    fn query_url_escapes_colon_and_slash() {
        let spec = QuerySpec::new("cat:cs.LG", 1);
        assert!(spec.to_url().contains("search_query=all:cat%3Acs.LG&"));
    }
}

//! arXiv search over the public Atom API.

use std::time::Duration;

use regex::Regex;

use crate::papers::{Paper, PaperInfo};
use crate::types::ToolError;

pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Where paper searches go. The server uses [`ArxivClient`]; tests use a
/// fixed list.
#[async_trait::async_trait]
pub trait PaperSource: Send + Sync {
    /// Most relevant papers for `topic`, at most `max_results`.
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<Paper>, ToolError>;
}

pub struct ArxivClient {
    base_url: String,
    client: reqwest::Client,
    feed: FeedParser,
}

impl ArxivClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolError::Upstream(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            feed: FeedParser::new()?,
        })
    }
}

#[async_trait::async_trait]
impl PaperSource for ArxivClient {
    async fn search(&self, topic: &str, max_results: usize) -> Result<Vec<Paper>, ToolError> {
        let query = format!("all:{topic}");
        let max = max_results.to_string();
        tracing::debug!(topic, max_results, "querying arXiv");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", query.as_str()),
                ("start", "0"),
                ("max_results", max.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::Upstream(e.to_string()))?;
        if !status.is_success() {
            return Err(ToolError::Upstream(format!("HTTP {}", status.as_u16())));
        }

        let mut papers = self.feed.parse(&body);
        papers.truncate(max_results);
        Ok(papers)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Atom feed parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Pulls entries out of an arXiv Atom feed. The feed layout is fixed, so
/// a handful of patterns cover it.
pub struct FeedParser {
    entry: Regex,
    id: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    author: Regex,
    pdf_link: Regex,
    whitespace: Regex,
}

impl FeedParser {
    pub fn new() -> Result<Self, ToolError> {
        let re = |pattern: &str| {
            Regex::new(pattern).map_err(|e| ToolError::Upstream(format!("feed pattern: {e}")))
        };
        Ok(Self {
            entry: re(r"(?s)<entry>(.*?)</entry>")?,
            id: re(r"(?s)<id>\s*(.*?)\s*</id>")?,
            title: re(r"(?s)<title[^>]*>(.*?)</title>")?,
            summary: re(r"(?s)<summary[^>]*>(.*?)</summary>")?,
            published: re(r"<published>\s*(.*?)\s*</published>")?,
            author: re(r"(?s)<author>\s*<name>(.*?)</name>")?,
            pdf_link: re(r#"<link[^>]*title="pdf"[^>]*href="([^"]+)"|<link[^>]*href="([^"]+)"[^>]*title="pdf""#)?,
            whitespace: re(r"\s+")?,
        })
    }

    /// Entries without an id or title are dropped.
    pub fn parse(&self, feed: &str) -> Vec<Paper> {
        self.entry
            .captures_iter(feed)
            .filter_map(|cap| self.parse_entry(cap.get(1)?.as_str()))
            .collect()
    }

    fn parse_entry(&self, entry: &str) -> Option<Paper> {
        let abs_url = first(&self.id, entry)?;
        let id = short_id(abs_url).to_string();
        let title = self.clean(first(&self.title, entry)?);
        let summary = self.clean(first(&self.summary, entry).unwrap_or_default());
        let authors = self
            .author
            .captures_iter(entry)
            .filter_map(|c| c.get(1).map(|m| self.clean(m.as_str())))
            .collect();
        let published = first(&self.published, entry)
            .map(published_date)
            .unwrap_or_default();
        let pdf_url = self
            .pdf_link
            .captures(entry)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| abs_url.replace("/abs/", "/pdf/"));

        Some(Paper {
            id,
            info: PaperInfo {
                title,
                summary,
                authors,
                published,
                pdf_url,
            },
        })
    }

    fn clean(&self, text: &str) -> String {
        decode_entities(self.whitespace.replace_all(text.trim(), " ").as_ref())
    }
}

fn first<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// `http://arxiv.org/abs/2401.01234v2` → `2401.01234v2`.
pub fn short_id(abs_url: &str) -> &str {
    abs_url
        .split_once("/abs/")
        .map(|(_, id)| id)
        .unwrap_or(abs_url)
}

/// RFC 3339 timestamp → `YYYY-MM-DD`; unparseable input is kept as is.
fn published_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Decode XML named and numeric character references in one pass.
/// Unknown or malformed references are kept verbatim.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| entity_char(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity_char(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let num = name.strip_prefix('#')?;
            let (digits, radix) = match num.strip_prefix(['x', 'X']) {
                Some(hex) => (hex, 16),
                None => (num, 10),
            };
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            char::from_u32(u32::from_str_radix(digits, radix).ok()?)
        }
    }
}

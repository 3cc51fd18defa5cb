//! arXiv search for the research answering path.
//!
//! Talks to the arXiv Atom API and parses the feed with plain string
//! scanning, which is enough for the title and summary fields we use.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use gena_core::GenerationRequest;

use crate::error::{Result, ToolError};

const ARXIV_API_BASE: &str = "https://export.arxiv.org/api/query";
const USER_AGENT: &str = "gena/0.1 (research assistant)";

/// System instruction for the research answering path.
const RESEARCH_INSTRUCTION: &str = "You are an AI research assistant. Summarize the provided \
     arXiv papers that are relevant to the user query, then answer the query drawing on them. \
     Cite paper titles when you use their content.";

/// Fallback context when the search returns no papers.
const NO_PAPERS_FALLBACK: &str = "No specific research papers found on arXiv for this topic.";

/// A paper extracted from the arXiv Atom feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArxivPaper {
    pub title: String,
    pub summary: String,
}

/// HTTP client for the arXiv API.
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ToolError::Research(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: ARXIV_API_BASE.to_string(),
        })
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search arXiv AI papers matching the query, most relevant first.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArxivPaper>> {
        let url = build_search_url(&self.base_url, query, max_results);
        debug!(%url, "arxiv search");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::Research(format!("arXiv request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Research(format!(
                "arXiv returned status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Research(format!("failed to read arXiv response: {e}")))?;

        Ok(parse_atom_feed(&body))
    }

    /// Compose the research generation prompt from search results.
    pub fn build_prompt(query: &str, papers: &[ArxivPaper]) -> GenerationRequest {
        let context = if papers.is_empty() {
            NO_PAPERS_FALLBACK.to_string()
        } else {
            papers
                .iter()
                .map(|p| format!("Title: {}\nSummary: {}\n---\n", p.title, p.summary))
                .collect()
        };

        GenerationRequest::text(format!(
            "arXiv search results:\n{context}\nUser query: {query}"
        ))
        .with_instruction(RESEARCH_INSTRUCTION)
    }
}

/// Build the arXiv API search URL, restricted to the cs.AI category.
fn build_search_url(base_url: &str, query: &str, max_results: usize) -> String {
    let search_query = format!("cat:cs.AI AND all:{query}");
    format!(
        "{}?search_query={}&start=0&max_results={}&sortBy=relevance",
        base_url,
        urlencoding::encode(&search_query),
        max_results,
    )
}

/// Parse the Atom feed, keeping every entry with a title.
fn parse_atom_feed(xml: &str) -> Vec<ArxivPaper> {
    extract_entries(xml)
        .iter()
        .filter_map(|entry| parse_entry(entry))
        .collect()
}

/// Extract all `<entry>...</entry>` blocks from the feed.
fn extract_entries(xml: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut search_from = 0;

    loop {
        let start = match xml[search_from..].find("<entry>") {
            Some(pos) => search_from + pos,
            None => break,
        };
        let end = match xml[start..].find("</entry>") {
            Some(pos) => start + pos + "</entry>".len(),
            None => break,
        };
        entries.push(&xml[start..end]);
        search_from = end;
    }

    entries
}

fn parse_entry(entry: &str) -> Option<ArxivPaper> {
    let title = normalize_whitespace(&extract_tag_text(entry, "title")?);
    let summary = normalize_whitespace(&extract_tag_text(entry, "summary").unwrap_or_default());
    Some(ArxivPaper { title, summary })
}

/// Extract the text content of the first `<tag ...>text</tag>` occurrence.
fn extract_tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let start_pos = xml.find(&open)?;
    let content_start = xml[start_pos..].find('>')? + start_pos + 1;
    let content_end = xml[content_start..].find(&close)? + content_start;

    Some(unescape_entities(xml[content_start..content_end].trim()))
}

/// Undo the handful of entities the arXiv feed actually emits.
fn unescape_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into single spaces.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <title>Attention Is All You Need</title>
    <summary>  The dominant sequence transduction models are based on complex
recurrent or convolutional neural networks.  </summary>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/1810.04805v2</id>
    <title>BERT: Pre-training of Deep Bidirectional Transformers</title>
    <summary>We introduce a new language representation model.</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_in_feed_order() {
        let papers = parse_atom_feed(SAMPLE_FEED);
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].title, "Attention Is All You Need");
        assert_eq!(
            papers[0].summary,
            "The dominant sequence transduction models are based on complex recurrent or \
             convolutional neural networks."
        );
        assert_eq!(papers[1].title, "BERT: Pre-training of Deep Bidirectional Transformers");
    }

    #[test]
    fn parses_empty_feed() {
        let papers = parse_atom_feed("<feed><title>ArXiv Query</title></feed>");
        assert!(papers.is_empty());
    }

    #[test]
    fn unescapes_entities_in_titles() {
        let feed = r#"<feed><entry>
            <title>Attention &amp; Memory in RNNs &#39;revisited&#39;</title>
            <summary>A &lt;new&gt; approach.</summary>
        </entry></feed>"#;
        let papers = parse_atom_feed(feed);
        assert_eq!(papers[0].title, "Attention & Memory in RNNs 'revisited'");
        assert_eq!(papers[0].summary, "A <new> approach.");
    }

    #[test]
    fn search_url_restricts_to_ai_category() {
        let url = build_search_url(ARXIV_API_BASE, "graph neural networks", 5);
        assert!(url.starts_with(ARXIV_API_BASE));
        assert!(url.contains("cat%3Acs.AI"));
        assert!(url.contains("graph%20neural%20networks"));
        assert!(url.contains("max_results=5"));
        assert!(url.contains("sortBy=relevance"));
    }

    #[test]
    fn prompt_formats_papers_or_fallback() {
        let papers = vec![ArxivPaper {
            title: "Paper One".to_string(),
            summary: "Summary one.".to_string(),
        }];
        let request = ArxivClient::build_prompt("query", &papers);
        assert!(request.prompt.contains("Title: Paper One\nSummary: Summary one.\n---\n"));

        let request = ArxivClient::build_prompt("query", &[]);
        assert!(request.prompt.contains("No specific research papers found"));
    }
}

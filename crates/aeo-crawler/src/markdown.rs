//! Lightweight markdown inspection used to pre-select content for extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)[ \t]*#*[ \t]*$").expect("valid regex"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\((https?://[^)\s]+)\)").expect("valid regex"));

const STOP_WORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "from", "have", "here", "into", "more", "most",
    "much", "only", "other", "over", "some", "such", "than", "that", "their", "them", "then",
    "there", "these", "they", "this", "very", "what", "when", "where", "which", "while", "with",
    "will", "your", "yours",
];

const MAX_KEYWORDS: usize = 10;
const MIN_SECTION_CHARS: usize = 100;

const ABOUT_MARKERS: &[&str] = &[
    "about", "company", "team", "mission", "vision", "values", "story",
];
const PRODUCT_MARKERS: &[&str] = &["product", "service", "solution", "feature", "pricing", "plan"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkdownLink {
    pub text: String,
    pub url: String,
}

/// A heading and the body text below it, up to the next heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub heading: String,
    pub level: usize,
    pub body: String,
}

/// Heading texts in document order, without duplicates.
#[must_use]
pub fn extract_headings(markdown: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HEADING
        .captures_iter(markdown)
        .filter_map(|cap| cap.get(2).map(|m| m.as_str().trim().to_owned()))
        .filter(|h| !h.is_empty() && seen.insert(h.clone()))
        .collect()
}

/// Absolute links, deduplicated by URL.
#[must_use]
pub fn extract_links(markdown: &str) -> Vec<MarkdownLink> {
    let mut seen = HashSet::new();
    LINK.captures_iter(markdown)
        .filter_map(|cap| {
            let url = cap.get(2)?.as_str().to_owned();
            if !seen.insert(url.clone()) {
                return None;
            }
            let text = cap.get(1).map_or("", |m| m.as_str()).trim().to_owned();
            Some(MarkdownLink { text, url })
        })
        .collect()
}

/// Up to ten distinctive lowercase words taken from headings.
#[must_use]
pub fn extract_keywords(markdown: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for heading in extract_headings(markdown) {
        for word in heading.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if word.chars().count() <= 3 || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            if seen.insert(word.clone()) {
                keywords.push(word);
                if keywords.len() == MAX_KEYWORDS {
                    return keywords;
                }
            }
        }
    }
    keywords
}

/// Splits a document on headings. Sections whose heading plus body is shorter
/// than 100 characters are dropped; text before the first heading is ignored.
#[must_use]
pub fn split_sections(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<Section> = None;

    for line in markdown.lines() {
        if let Some(cap) = HEADING.captures(line) {
            if let Some(done) = current.take() {
                sections.push(done);
            }
            current = Some(Section {
                heading: cap.get(2).map_or("", |m| m.as_str()).trim().to_owned(),
                level: cap.get(1).map_or(1, |m| m.as_str().len()),
                body: String::new(),
            });
        } else if let Some(section) = current.as_mut() {
            section.body.push_str(line);
            section.body.push('\n');
        }
    }
    if let Some(done) = current {
        sections.push(done);
    }

    sections
        .into_iter()
        .map(|mut s| {
            s.body = s.body.trim().to_owned();
            s
        })
        .filter(|s| s.heading.chars().count() + s.body.chars().count() >= MIN_SECTION_CHARS)
        .collect()
}

fn heading_matches(section: &Section, markers: &[&str]) -> bool {
    let heading = section.heading.to_lowercase();
    markers.iter().any(|m| heading.contains(m))
}

/// First section that reads like an about/company page.
#[must_use]
pub fn find_about_section(markdown: &str) -> Option<Section> {
    split_sections(markdown)
        .into_iter()
        .find(|s| heading_matches(s, ABOUT_MARKERS))
}

/// Sections that describe products, services or pricing.
#[must_use]
pub fn find_product_sections(markdown: &str) -> Vec<Section> {
    split_sections(markdown)
        .into_iter()
        .filter(|s| heading_matches(s, PRODUCT_MARKERS))
        .collect()
}

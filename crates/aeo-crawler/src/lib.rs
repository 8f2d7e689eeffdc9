pub mod client;
pub mod error;
pub mod markdown;
pub mod normalize;
mod retry;
pub mod types;

pub use client::FirecrawlClient;
pub use error::CrawlerError;
pub use markdown::{
    extract_headings, extract_keywords, extract_links, find_about_section, find_product_sections,
    split_sections, MarkdownLink, Section,
};
pub use normalize::normalize_url;
pub use types::{CrawlOptions, CrawlResult, PageMetadata};

//! Article-aware chunking
//!
//! Korean legal and contractual text is article-indexed ("제N조").
//! Chunks that respect article boundaries keep retrieval citations
//! aligned with the articles they cite, so we split on headings first
//! and only length-window inside each article.

use crate::error::ChunkError;
use gyeyak_domain::{ContractChunk, DocumentId};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Default window and overlap, in chars
const MAX_WINDOW: usize = 1200;
const OVERLAP: usize = 200;
/// Windows shorter than this are merged into their predecessor
const MIN_CHUNK: usize = 200;
/// Inputs shorter than this cannot be meaningfully chunked
const MIN_TEXT: usize = 10;

fn article_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*제\s*(\d+)\s*조").unwrap())
}

struct Section {
    article: Option<u32>,
    body: String,
    synthetic: bool,
}

/// Splits legal text into article-aligned, length-bounded chunks
pub struct ArticleChunker {
    max_window: usize,
    overlap: usize,
}

impl ArticleChunker {
    /// Chunker with the default 1200/200 window
    pub fn new() -> Self {
        Self {
            max_window: MAX_WINDOW,
            overlap: OVERLAP,
        }
    }

    /// Override the window geometry (mainly for tests)
    pub fn with_window(mut self, max_window: usize, overlap: usize) -> Self {
        assert!(overlap < max_window * 7 / 10, "overlap must stay below the split floor");
        self.max_window = max_window;
        self.overlap = overlap;
        self
    }

    /// Chunk `text` into article-aligned segments. Every chunk inherits
    /// `base_meta`; `chunk_index` is contiguous from 0.
    pub fn chunk(
        &self,
        document_id: DocumentId,
        text: &str,
        base_meta: &HashMap<String, String>,
    ) -> Result<Vec<ContractChunk>, ChunkError> {
        let char_count = text.chars().count();
        if char_count < MIN_TEXT {
            return Err(ChunkError::TooShort(char_count));
        }

        let sections = split_articles(text);
        let mut chunks = Vec::new();

        for section in &sections {
            let mut windows = self.split_windows(&section.body);
            merge_short_windows(&mut windows);

            for (paragraph_index, window) in windows.into_iter().enumerate() {
                let content = window.trim().to_string();
                if content.is_empty() {
                    continue;
                }
                let mut metadata = base_meta.clone();
                if section.synthetic {
                    metadata.insert("section".to_string(), "전체".to_string());
                }
                chunks.push(ContractChunk {
                    document_id,
                    article_number: section.article,
                    paragraph_index: Some(paragraph_index as u32),
                    content,
                    chunk_index: 0, // re-indexed below
                    metadata,
                });
            }
        }

        if chunks.is_empty() {
            return Err(ChunkError::AllEmpty);
        }
        for (index, chunk) in chunks.iter_mut().enumerate() {
            chunk.chunk_index = index;
        }

        debug!(
            sections = sections.len(),
            chunks = chunks.len(),
            "Chunked contract text"
        );
        Ok(chunks)
    }

    /// Sliding window over chars: max `max_window`, overlap `overlap`,
    /// preferring to split at the last sentence terminator past 70% of
    /// the window.
    fn split_windows(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.max_window {
            return vec![text.to_string()];
        }

        let mut windows = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.max_window).min(chars.len());
            let mut split = end;
            if end < chars.len() {
                let floor = start + self.max_window * 7 / 10;
                if let Some(pos) = (floor..end).rev().find(|&i| chars[i] == '.' || chars[i] == '\n')
                {
                    split = pos + 1;
                }
            }
            windows.push(chars[start..split].iter().collect());
            if split >= chars.len() {
                break;
            }
            start = split.saturating_sub(self.overlap);
        }
        windows
    }
}

impl Default for ArticleChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Split on "제N조" headings. Text before the first heading is the
/// preamble (no article number); text with no headings at all becomes
/// one synthetic "전체" section.
fn split_articles(text: &str) -> Vec<Section> {
    let matches: Vec<(usize, u32)> = article_heading()
        .captures_iter(text)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            let number = caps.get(1)?.as_str().parse().ok()?;
            Some((start, number))
        })
        .collect();

    if matches.is_empty() {
        return vec![Section {
            article: None,
            body: text.to_string(),
            synthetic: true,
        }];
    }

    let mut sections = Vec::new();
    let preamble = &text[..matches[0].0];
    if !preamble.trim().is_empty() {
        sections.push(Section {
            article: None,
            body: preamble.to_string(),
            synthetic: false,
        });
    }
    for (i, &(start, number)) in matches.iter().enumerate() {
        let end = matches.get(i + 1).map(|&(s, _)| s).unwrap_or(text.len());
        sections.push(Section {
            article: Some(number),
            body: text[start..end].to_string(),
            synthetic: false,
        });
    }
    sections
}

/// Merge windows shorter than `MIN_CHUNK` chars into their predecessor
fn merge_short_windows(windows: &mut Vec<String>) {
    let mut merged: Vec<String> = Vec::with_capacity(windows.len());
    for window in windows.drain(..) {
        let short = window.trim().chars().count() < MIN_CHUNK;
        match merged.last_mut() {
            Some(prev) if short => {
                prev.push('\n');
                prev.push_str(&window);
            }
            _ => merged.push(window),
        }
    }
    *windows = merged;
}

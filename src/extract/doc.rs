//! Header-driven sectioning of markdown documents
//!
//! A document is scanned line by line. Every ATX header line (one to five `#`)
//! closes the section accumulated so far and starts a new one, and the header
//! hierarchy is updated so that deeper levels are forgotten.
//!
//! Matching is purely structural: header-like lines inside fenced code blocks
//! also start a new section.

use super::Chunk;
use regex::Regex;
use std::sync::OnceLock;

/// Deepest header level that starts a new section
pub const MAX_HEADER_DEPTH: usize = 5;

static RE_HEADER: OnceLock<Regex> = OnceLock::new();

fn header_regex() -> &'static Regex {
    RE_HEADER.get_or_init(|| Regex::new(r"^(#{1,5})\s+(.+)$").unwrap())
}

/// A line recognized as a section header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLine<'a> {
    /// Number of leading `#` characters (1 to 5)
    pub level: usize,
    /// Header text with surrounding whitespace removed
    pub text: &'a str,
}

/// Test whether a line is a header of level 1 to 5
///
/// Six or more `#` never match. A `#` run followed by whitespace only matches
/// when at least two whitespace characters follow, yielding empty text.
pub fn match_header(line: &str) -> Option<HeaderLine<'_>> {
    let captures = header_regex().captures(line)?;
    let hashes = captures.get(1)?;
    let text = captures.get(2)?;

    Some(HeaderLine {
        level: hashes.as_str().len(),
        text: text.as_str().trim(),
    })
}

/// Most recently seen header text at each level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderHierarchy {
    levels: [String; MAX_HEADER_DEPTH],
}

impl HeaderHierarchy {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header at `level` and clear every deeper level
    ///
    /// Levels outside `1..=MAX_HEADER_DEPTH` are ignored.
    pub fn set(&mut self, level: usize, text: &str) {
        if !(1..=MAX_HEADER_DEPTH).contains(&level) {
            return;
        }

        self.levels[level - 1] = text.to_string();
        for slot in &mut self.levels[level..] {
            slot.clear();
        }
    }

    /// Get the header at `level`, if set
    pub fn get(&self, level: usize) -> Option<&str> {
        if !(1..=MAX_HEADER_DEPTH).contains(&level) {
            return None;
        }

        let text = self.levels[level - 1].as_str();
        (!text.is_empty()).then_some(text)
    }

    /// Set headers from outermost to innermost, skipping unset levels
    pub fn active(&self) -> Vec<String> {
        self.levels
            .iter()
            .filter(|h| !h.is_empty())
            .cloned()
            .collect()
    }

    /// Check whether no level is set
    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(|h| h.is_empty())
    }
}

/// Split a document into chunks along header boundaries
///
/// Chunk ids are `{source}_0`, `{source}_1`, ... in document order. Each
/// chunk's headers reflect the hierarchy at the moment the chunk is closed,
/// and its text starts with its own header line when it has one.
pub fn section(content: &str, source: &str) -> Vec<Chunk> {
    let mut sectioner = Sectioner::new(source);

    for line in content.split('\n') {
        sectioner.push_line(line);
    }

    sectioner.finish()
}

/// Accumulate-then-flush state for a single document
struct Sectioner<'a> {
    source: &'a str,
    hierarchy: HeaderHierarchy,
    buffer: Vec<&'a str>,
    chunks: Vec<Chunk>,
}

impl<'a> Sectioner<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            hierarchy: HeaderHierarchy::new(),
            buffer: Vec::new(),
            chunks: Vec::new(),
        }
    }

    fn push_line(&mut self, line: &'a str) {
        if let Some(header) = match_header(line) {
            self.flush();
            self.hierarchy.set(header.level, header.text);
        }

        self.buffer.push(line);
    }

    /// Close the current section, emitting a chunk when it has content
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let joined = self.buffer.join("\n");
        self.buffer.clear();

        let text = joined.trim();
        if text.is_empty() {
            return;
        }

        let sequence = self.chunks.len();
        self.chunks.push(Chunk::new(
            self.source,
            sequence,
            self.hierarchy.active(),
            text,
        ));
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_of(chunk: &Chunk) -> Vec<&str> {
        chunk.headers.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_match_header_levels() {
        assert_eq!(
            match_header("# Title"),
            Some(HeaderLine { level: 1, text: "Title" })
        );
        assert_eq!(
            match_header("##### Deep  "),
            Some(HeaderLine { level: 5, text: "Deep" })
        );
        assert_eq!(
            match_header("###\tTabbed"),
            Some(HeaderLine { level: 3, text: "Tabbed" })
        );
    }

    #[test]
    fn test_match_header_rejects_non_headers() {
        assert_eq!(match_header("###### Six"), None);
        assert_eq!(match_header("#NoSpace"), None);
        assert_eq!(match_header("# "), None);
        assert_eq!(match_header("#"), None);
        assert_eq!(match_header(" # Indented"), None);
        assert_eq!(match_header("plain text"), None);
        assert_eq!(match_header(""), None);
    }

    #[test]
    fn test_match_header_whitespace_only_text() {
        assert_eq!(
            match_header("#   "),
            Some(HeaderLine { level: 1, text: "" })
        );
    }

    #[test]
    fn test_hierarchy_clears_deeper_levels() {
        let mut hierarchy = HeaderHierarchy::new();
        hierarchy.set(1, "H1");
        hierarchy.set(2, "H2");
        hierarchy.set(3, "H3");
        hierarchy.set(5, "H5");
        assert_eq!(hierarchy.active(), vec!["H1", "H2", "H3", "H5"]);

        hierarchy.set(2, "H2");
        assert_eq!(hierarchy.active(), vec!["H1", "H2"]);
        assert_eq!(hierarchy.get(3), None);
        assert_eq!(hierarchy.get(5), None);
    }

    #[test]
    fn test_hierarchy_ignores_out_of_range_levels() {
        let mut hierarchy = HeaderHierarchy::new();
        hierarchy.set(0, "zero");
        hierarchy.set(6, "six");
        assert!(hierarchy.is_empty());
        assert_eq!(hierarchy.get(0), None);
        assert_eq!(hierarchy.get(6), None);
    }

    #[test]
    fn test_single_section() {
        let content = "# Title\n\nThis is the content of the section.\nIt has multiple lines.";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 1);
        assert_eq!(headers_of(&chunks[0]), vec!["Title"]);
        assert!(chunks[0].text.starts_with("# Title"));
        assert!(chunks[0].text.contains("content of the section"));
    }

    #[test]
    fn test_multiple_sections() {
        let content = "# Section One\n\nContent one.\n\n# Section Two\n\nContent two.";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 2);
        assert_eq!(headers_of(&chunks[0]), vec!["Section One"]);
        assert_eq!(chunks[0].text, "# Section One\n\nContent one.");
        assert_eq!(headers_of(&chunks[1]), vec!["Section Two"]);
        assert_eq!(chunks[1].text, "# Section Two\n\nContent two.");
    }

    #[test]
    fn test_nested_headers() {
        let content = "# Main\n\n## Sub Section\n\nContent here.\n\n### Deep Section\n\nMore content.";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 3);
        assert_eq!(headers_of(&chunks[0]), vec!["Main"]);
        assert_eq!(headers_of(&chunks[1]), vec!["Main", "Sub Section"]);
        assert_eq!(
            headers_of(&chunks[2]),
            vec!["Main", "Sub Section", "Deep Section"]
        );
    }

    #[test]
    fn test_hierarchy_reset_on_sibling_header() {
        let content = "# H1\n\n## H2\n\n### H3\n\nX\n\n## H2b\n\nY";
        let chunks = section(content, "test");

        let y_chunk = chunks.iter().find(|c| c.text.contains('Y')).unwrap();
        assert_eq!(headers_of(y_chunk), vec!["H1", "H2b"]);

        let x_chunk = chunks.iter().find(|c| c.text.contains('X')).unwrap();
        assert_eq!(headers_of(x_chunk), vec!["H1", "H2", "H3"]);
    }

    #[test]
    fn test_same_text_header_still_resets_deeper_levels() {
        let content = "# A\n## B\n### C\ntext\n## B\nmore";
        let chunks = section(content, "test");

        let last = chunks.last().unwrap();
        assert_eq!(headers_of(last), vec!["A", "B"]);
        assert_eq!(last.text, "## B\nmore");
    }

    #[test]
    fn test_consecutive_headers_emit_header_only_chunks() {
        let content = "# H1\n\n## H2\n\n### H3\n\nX";
        let chunks = section(content, "doc");

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "# H1");
        assert_eq!(headers_of(&chunks[0]), vec!["H1"]);
        assert_eq!(chunks[1].text, "## H2");
        assert_eq!(headers_of(&chunks[1]), vec!["H1", "H2"]);
        assert_eq!(chunks[2].text, "### H3\n\nX");
        assert_eq!(headers_of(&chunks[2]), vec!["H1", "H2", "H3"]);
    }

    #[test]
    fn test_ids_are_sequential_per_source() {
        let content = "# One\n\nText.\n\n# Two\n\nText.\n\n# Three\n\nText.";
        let chunks = section(content, "doc");

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["doc_0", "doc_1", "doc_2"]);
    }

    #[test]
    fn test_ids_have_no_gaps_when_sections_are_empty() {
        let content = "\n\n   \n# A\n\n\n# B\nbody";
        let chunks = section(content, "gap");

        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["gap_0", "gap_1"]);
        assert_eq!(chunks[0].text, "# A");
    }

    #[test]
    fn test_source_preserved() {
        let chunks = section("# Test\n\nContent.\n\n## More\n\nText", "my_source");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.source == "my_source"));
        assert!(chunks.iter().all(|c| c.id.starts_with("my_source_")));
    }

    #[test]
    fn test_empty_and_whitespace_documents() {
        assert!(section("", "test").is_empty());
        assert!(section("   \n\n  ", "test").is_empty());
        assert!(section("\n", "test").is_empty());
    }

    #[test]
    fn test_content_without_headers() {
        let content = "\n\n  Just some text\nwithout any headers.  \n\n";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].headers.is_empty());
        assert_eq!(chunks[0].text, content.trim());
        assert_eq!(chunks[0].id, "test_0");
    }

    #[test]
    fn test_preamble_before_first_header_has_no_headers() {
        let content = "Intro paragraph.\n\n# First\n\nBody.";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].headers.is_empty());
        assert_eq!(chunks[0].text, "Intro paragraph.");
        assert_eq!(headers_of(&chunks[1]), vec!["First"]);
    }

    #[test]
    fn test_h5_headers_supported() {
        let content = "# H1\n\n## H2\n\n### H3\n\n#### H4\n\n##### H5\n\nContent at H5 level.";
        let chunks = section(content, "test");

        let h5 = chunks.last().unwrap();
        assert_eq!(headers_of(h5), vec!["H1", "H2", "H3", "H4", "H5"]);
        assert!(h5.text.contains("Content at H5 level."));
    }

    #[test]
    fn test_six_hashes_folded_into_content() {
        let content = "# Top\n\nintro\n###### Not a header\ntail";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 1);
        assert_eq!(headers_of(&chunks[0]), vec!["Top"]);
        assert!(chunks[0].text.contains("###### Not a header"));
        assert!(chunks[0].text.ends_with("tail"));
    }

    #[test]
    fn test_skipped_level_is_dense() {
        let content = "# A\n### C\nbody";
        let chunks = section(content, "test");

        assert_eq!(headers_of(chunks.last().unwrap()), vec!["A", "C"]);
    }

    #[test]
    fn test_whitespace_only_header_clears_level() {
        let content = "# A\n## B\nbody\n##   \nafter";
        let chunks = section(content, "test");

        let last = chunks.last().unwrap();
        assert_eq!(headers_of(last), vec!["A"]);
        assert!(last.text.ends_with("after"));
    }

    #[test]
    fn test_headers_inside_code_fence_still_split() {
        let content = "# Code Example\n\n```bash\n# install deps\nmake\n```\n\nEnd of section.";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "# Code Example\n\n```bash");
        assert_eq!(headers_of(&chunks[1]), vec!["install deps"]);
        assert!(chunks[1].text.contains("End of section."));
    }

    #[test]
    fn test_preserves_code_blocks_without_header_lines() {
        let content = "# Code Example\n\n```python\ndef hello():\n    print(\"world\")\n```\n\nEnd of section.";
        let chunks = section(content, "test");

        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("def hello():"));
        assert!(chunks[0].text.contains("print(\"world\")"));
    }

    #[test]
    fn test_preserves_lists() {
        let content = "# List Section\n\n- Item 1\n- Item 2\n- Item 3";
        let chunks = section(content, "test");

        assert!(chunks[0].text.contains("- Item 1"));
        assert!(chunks[0].text.contains("- Item 2"));
        assert!(chunks[0].text.contains("- Item 3"));
    }

    #[test]
    fn test_mixed_language_content() {
        let content =
            "# Overview\n\nThis section is in English.\n\n## 概要\n\nこのセクションは日本語です。";
        let chunks = section(content, "mixed");

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, "mixed_0");
        assert_eq!(headers_of(&chunks[0]), vec!["Overview"]);
        assert!(chunks[0].text.contains("This section is in English."));
        assert_eq!(chunks[1].id, "mixed_1");
        assert_eq!(headers_of(&chunks[1]), vec!["Overview", "概要"]);
        assert!(chunks[1].text.contains("このセクションは日本語です。"));
    }

    #[test]
    fn test_japanese_content() {
        let content = "# 購買ルール\n\nユーザーは色マッチングに基づいてアイテムを購入します。\n\n## 赤いアイテム\n\nR値が高いユーザーは赤いアイテムを購入します。";
        let chunks = section(content, "rules_ja");

        assert_eq!(chunks.len(), 2);
        assert_eq!(headers_of(&chunks[0]), vec!["購買ルール"]);
        assert!(chunks[0].text.contains("色マッチング"));
        assert_eq!(headers_of(&chunks[1]), vec!["購買ルール", "赤いアイテム"]);
    }

    #[test]
    fn test_carriage_returns_are_content() {
        let content = "# Title\r\nline one\r\nline two\r\n";
        let chunks = section(content, "crlf");

        assert_eq!(chunks.len(), 1);
        assert_eq!(headers_of(&chunks[0]), vec!["Title"]);
        assert_eq!(chunks[0].text, "# Title\r\nline one\r\nline two");
    }

    #[test]
    fn test_independent_calls_do_not_share_state() {
        let first = section("# A\n## B\ntext", "one");
        let second = section("plain", "two");

        assert_eq!(headers_of(first.last().unwrap()), vec!["A", "B"]);
        assert_eq!(second.len(), 1);
        assert!(second[0].headers.is_empty());
        assert_eq!(second[0].id, "two_0");
    }
}

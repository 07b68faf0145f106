//! Reading time estimation

use lazy_static::lazy_static;
use regex::Regex;

use super::post::ContentBlock;
use super::rich_text;

/// Fixed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s").expect("valid regex");
}

/// Minutes needed to read the given content, rounded up.
///
/// Every heading and the plain text of every body are concatenated without
/// a separator, then split on each single whitespace character. Empty
/// pieces are counted, so empty content still reads as one word and one
/// minute.
pub fn estimate_minutes(content: &[ContentBlock]) -> u32 {
    let mut buffer = String::new();
    for block in content {
        buffer.push_str(&block.heading);
        buffer.push_str(&rich_text::as_text(&block.body));
    }

    let words = count_words(&buffer);
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

fn count_words(text: &str) -> usize {
    WHITESPACE.split(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichTextNode;

    fn block(heading: &str, paragraphs: &[&str]) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            body: paragraphs.iter().map(|p| RichTextNode::paragraph(p)).collect(),
        }
    }

    fn words(n: usize) -> String {
        vec!["palavra"; n].join(" ")
    }

    #[test]
    fn test_empty_content_reads_in_one_minute() {
        assert_eq!(estimate_minutes(&[]), 1);
        assert_eq!(estimate_minutes(&[block("", &[])]), 1);
    }

    #[test]
    fn test_rounds_up() {
        assert_eq!(estimate_minutes(&[block(&words(400), &[])]), 2);
        assert_eq!(estimate_minutes(&[block(&words(401), &[])]), 3);
        assert_eq!(estimate_minutes(&[block(&words(199), &[])]), 1);
    }

    #[test]
    fn test_heading_and_body_are_glued() {
        // "Title" + "one two" -> "Titleone two": two tokens
        assert_eq!(count_words("Titleone two"), 2);
        let content = [block("Title", &["one two"])];
        assert_eq!(estimate_minutes(&content), 1);
    }

    #[test]
    fn test_every_whitespace_char_splits() {
        assert_eq!(count_words(""), 1);
        assert_eq!(count_words("a  b"), 3);
        assert_eq!(count_words("a\nb\tc"), 3);
        assert_eq!(count_words(" "), 2);
    }

    #[test]
    fn test_counts_across_blocks() {
        // 150 + 100 body words, headings glued to the first body word
        let content = [
            block("Um", &[&words(150)]),
            block("Dois", &[&words(100)]),
        ];
        assert_eq!(estimate_minutes(&content), 2);
    }
}

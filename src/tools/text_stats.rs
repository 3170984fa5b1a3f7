//! Character counter.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub words: usize,
    pub sentences: usize,
    pub paragraphs: usize,
    pub lines: usize,
}

/// Count characters (Unicode scalar values), words, sentences, paragraphs and lines.
///
/// Sentences end at `.`, `!` or `?`; a trailing fragment without terminator
/// still counts. Paragraphs are separated by blank lines.
pub fn analyze(text: &str) -> TextStats {
    if text.trim().is_empty() {
        return TextStats {
            characters: text.chars().count(),
            lines: text.lines().count(),
            ..Default::default()
        };
    }

    let sentences = text
        .split(['.', '!', '?'])
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .count();

    let mut paragraphs = 0;
    let mut in_paragraph = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            paragraphs += 1;
            in_paragraph = true;
        }
    }

    TextStats {
        characters: text.chars().count(),
        characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
        words: text.split_whitespace().count(),
        sentences,
        paragraphs,
        lines: text.lines().count(),
    }
}

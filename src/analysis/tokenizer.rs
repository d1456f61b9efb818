//! Unicode-aware tokenization.
//!
//! Splits text on whitespace and punctuation boundaries while keeping
//! punctuation-joined compounds (`React.js`, `socket-io`, `snake_case`)
//! together as a single token, so that they normalize to one term
//! (`reactjs`, `socketio`, `snakecase`).

use unicode_segmentation::UnicodeSegmentation;

use super::token::{Token, TokenKind};

/// Joining punctuation that binds two alphanumeric runs into one token.
fn is_joiner(segment: &str) -> bool {
    matches!(segment, "." | "-" | "_")
}

/// Lowercase and strip punctuation, applying the punctuation-joining rule:
/// `.`/`-`/`_` between alphanumerics are removed rather than treated as
/// separators, so `"React.js"` becomes `"reactjs"`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            for lc in c.to_lowercase() {
                out.push(lc);
            }
        }
    }
    out
}

fn classify(text: &str) -> TokenKind {
    let mut saw_alphanumeric = false;
    let mut all_digits = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            saw_alphanumeric = true;
            if !c.is_ascii_digit() {
                all_digits = false;
            }
        }
    }
    if !saw_alphanumeric {
        TokenKind::Symbol
    } else if all_digits {
        TokenKind::Number
    } else {
        TokenKind::Word
    }
}

/// Split text into word, number and symbol tokens.
///
/// Always terminates; empty input yields an empty sequence.
pub fn tokenize(text: &str) -> Vec<Token> {
    let segments: Vec<&str> = text.split_word_bounds().collect();
    let mut tokens = Vec::new();
    let mut position = 0;
    let mut i = 0;

    while i < segments.len() {
        let segment = segments[i];
        if segment.chars().all(char::is_whitespace) {
            i += 1;
            continue;
        }

        if segment.chars().any(char::is_alphanumeric) {
            // Fold joiner-connected runs into one token.
            let mut original = String::from(segment);
            let mut j = i + 1;
            while j + 1 < segments.len()
                && is_joiner(segments[j])
                && segments[j + 1].chars().any(char::is_alphanumeric)
            {
                original.push_str(segments[j]);
                original.push_str(segments[j + 1]);
                j += 2;
            }
            let kind = classify(&original);
            let normalized = normalize(&original);
            tokens.push(Token::new(original, normalized, kind, position));
            position += 1;
            i = j;
        } else {
            tokens.push(Token::new(segment, segment, TokenKind::Symbol, position));
            position += 1;
            i += 1;
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_words_and_positions() {
        let tokens = tokenize("React JavaScript library");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].normalized, "react");
        assert_eq!(tokens[1].normalized, "javascript");
        assert_eq!(tokens[2].position, 2);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Word));
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
    }

    #[test]
    fn test_punctuation_joining() {
        let tokens = tokenize("React.js and socket-io");
        assert_eq!(tokens[0].text, "React.js");
        assert_eq!(tokens[0].normalized, "reactjs");
        let socket = tokens.iter().find(|t| t.text == "socket-io").unwrap();
        assert_eq!(socket.normalized, "socketio");
    }

    #[test]
    fn test_normalize_rule() {
        assert_eq!(normalize("React.js"), "reactjs");
        assert_eq!(normalize("Node.js"), "nodejs");
        assert_eq!(normalize("snake_case"), "snakecase");
    }

    #[test]
    fn test_number_and_symbol_kinds() {
        let tokens = tokenize("v2 100 !");
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[2].kind, TokenKind::Symbol);
    }
}

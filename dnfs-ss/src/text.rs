//! Sentence/word splitting and joining rules for the WRITE transaction
//! protocol (§4.3). Pure functions, no I/O, so the commit path can be
//! exercised without touching disk.

/// `.`, `!`, `?` terminate a sentence and are themselves single words.
fn is_delimiter(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

pub fn is_delimiter_word(word: &str) -> bool {
    matches!(word, "." | "!" | "?")
}

/// Splits `content` into sentences. Every sentence but a possible final
/// one ends with its delimiter; a trailing fragment with no delimiter
/// has its leading whitespace trimmed and is dropped entirely if that
/// leaves it empty.
pub fn split_sentences(content: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for c in content.chars() {
        current.push(c);
        if is_delimiter(c) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    let trimmed = current.trim_start();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

/// A sentence ends with a delimiter unless it is the dangling trailing
/// fragment produced by [`split_sentences`].
pub fn sentence_ends_with_delimiter(sentence: &str) -> bool {
    sentence.chars().next_back().is_some_and(is_delimiter)
}

/// Splits a single sentence into whitespace-separated words, with each
/// delimiter character peeled off as its own trailing word.
pub fn split_words(sentence: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in sentence.chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if is_delimiter(c) {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            words.push(c.to_string());
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Rejoins words with a single space between them, except no space is
/// inserted immediately before a delimiter word.
pub fn join_words(words: &[String]) -> String {
    let mut out = String::new();
    for word in words {
        if !out.is_empty() && !is_delimiter_word(word) {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Concatenates sentences with no separator between them.
pub fn join_sentences(sentences: &[String]) -> String {
    sentences.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_three_delimited_sentences() {
        let sentences = split_sentences("Hello world. How are you? Fine!");
        assert_eq!(sentences, vec!["Hello world.", " How are you?", " Fine!"]);
    }

    #[test]
    fn trailing_fragment_has_leading_whitespace_trimmed() {
        let sentences = split_sentences("One. two words with no end");
        assert_eq!(sentences, vec!["One.", "two words with no end"]);
        assert!(!sentence_ends_with_delimiter(&sentences[1]));
    }

    #[test]
    fn pure_whitespace_tail_is_not_a_sentence() {
        let sentences = split_sentences("One.   ");
        assert_eq!(sentences, vec!["One."]);
    }

    #[test]
    fn words_split_delimiter_as_its_own_token() {
        assert_eq!(split_words("Hello world."), vec!["Hello", "world", "."]);
    }

    #[test]
    fn join_words_omits_space_before_delimiter() {
        let words = vec!["Hello".to_string(), "world".to_string(), ".".to_string()];
        assert_eq!(join_words(&words), "Hello world.");
    }

    #[test]
    fn round_trip_split_then_join_is_identity_for_well_formed_sentence() {
        let sentence = "Hello world.";
        let words = split_words(sentence);
        assert_eq!(join_words(&words), sentence);
    }
}

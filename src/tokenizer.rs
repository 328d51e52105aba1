
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Tokens shorter than this (counted in chars) are discarded.
pub const MIN_TOKEN_LEN: usize = 2;

/// The NLTK english stopword list.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

// loaded once per process, read-only afterwards
static ENGLISH: OnceLock<Arc<StopWordList>> = OnceLock::new();

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopWordList {
    words: HashSet<String>,
}

impl StopWordList {

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> {
        let mut words: HashSet<String> = words.into_iter().map(Into::into).collect();
        words.shrink_to_fit();
        Self { words }
    }

    /// The shared english list.
    pub fn english() -> Arc<StopWordList> {
        ENGLISH
            .get_or_init(|| Arc::new(StopWordList::from_words(ENGLISH_STOP_WORDS.iter().copied())))
            .clone()
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}


/// Turns raw text into normalized word tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: Arc<StopWordList>,
}

impl Tokenizer {

    pub fn new(stop_words: Arc<StopWordList>) -> Self {
        Self { stop_words }
    }

    pub fn english() -> Self {
        Self::new(StopWordList::english())
    }

    pub fn stop_words(&self) -> &StopWordList {
        &self.stop_words
    }

    /// Lowercases, strips punctuation and standalone numbers, splits into
    /// sentences and words, then drops short words and stopwords.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned = drop_numeric(&collapse_non_alphanumeric(text));
        cleaned
            .unicode_sentences()
            .flat_map(|sentence| sentence.unicode_words())
            .filter(|word| word.chars().count() >= MIN_TOKEN_LEN)
            .filter(|word| !self.stop_words.contains(word))
            .map(str::to_owned)
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::english()
    }
}


// every run of non-alphanumeric graphemes becomes a single space. A
// grapheme is judged by its base char so combining marks stay in the word,
// marks that only appear through lowercasing (the dot of `İ`) are dropped.
fn collapse_non_alphanumeric(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_gap = false;
    for grapheme in text.graphemes(true) {
        let mut chars = grapheme.chars();
        match chars.next() {
            Some(base) if base.is_alphanumeric() => {
                out.extend(base.to_lowercase().filter(|c| c.is_alphanumeric()));
                out.extend(chars.flat_map(char::to_lowercase));
                in_gap = false;
            },
            _ if !in_gap => {
                out.push(' ');
                in_gap = true;
            },
            _ => {},
        }
    }
    out
}

fn drop_numeric(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !word.chars().all(char::is_numeric))
        .collect::<Vec<&str>>()
        .join(" ")
}


#[cfg(test)]
mod tests {

    use std::sync::Arc;
    use super::{StopWordList, Tokenizer, MIN_TOKEN_LEN};

    #[test]
    fn quick_fox_test() {
        let tokenizer = Tokenizer::new(Arc::new(StopWordList::from_words(["the"])));
        assert_eq!(
            tokenizer.tokenize("The quick, quick fox runs."),
            vec!["quick", "quick", "fox", "runs"]
        );
    }

    #[test]
    fn strips_numbers_and_punctuation() {
        let tokenizer = Tokenizer::english();
        let tokens = tokenizer.tokenize("In 1969, Apollo-11 landed!!! on the moon... 42 times?");
        assert_eq!(tokens, vec!["apollo", "landed", "moon", "times"]);
    }

    #[test]
    fn no_short_or_stop_words() {
        let tokenizer = Tokenizer::english();
        let text = "I am a Rust programmer; it's x-y-z of my own, and he's at home. \
            Don't you think? We'll see: e = mc 2 and q.e.d.";
        let tokens = tokenizer.tokenize(text);
        assert!(!tokens.is_empty());
        for token in &tokens {
            assert!(token.chars().count() >= MIN_TOKEN_LEN, "short token {}", token);
            assert!(!tokenizer.stop_words().contains(token), "stopword {}", token);
            assert_eq!(token, &token.to_lowercase());
        }
    }

    #[test]
    fn empty_and_blank_input() {
        let tokenizer = Tokenizer::english();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("  ... 123 !! ").is_empty());
    }

    #[test]
    fn accents_stay_in_the_word() {
        let tokenizer = Tokenizer::english();
        assert_eq!(tokenizer.tokenize("İstanbul CAFÉ"), vec!["istanbul", "café"]);
        // e followed by a combining acute accent
        assert_eq!(tokenizer.tokenize("cafe\u{301} noir"), vec!["cafe\u{301}", "noir"]);
    }

    #[test]
    fn english_list_is_shared() {
        let a = StopWordList::english();
        let b = StopWordList::english();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains("the"));
        assert_eq!(a.len(), 179);
    }
}

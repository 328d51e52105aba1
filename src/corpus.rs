
// re-iterable corpus views. A view holds only its source (a path or the
// in-memory documents) and a per-line transform; every call to `stream`
// builds a brand new traversal, so algorithms needing several passes
// (vocabulary, then weighting, then epochs of training) can walk it again.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use std::slice;
use crate::dictionary::Dictionary;
use crate::errors::{Error, Result};
use crate::tokenizer::Tokenizer;


/// A repeatable sequence of records.
pub trait Corpus {
    type Item;
    type Iter<'a>: Iterator<Item = Result<Self::Item>> where Self: 'a;

    /// Starts a fresh traversal from the first record.
    fn stream(&self) -> Result<Self::Iter<'_>>;
}

/// What a corpus view does with each raw line.
pub trait LineTransform {
    type Output;
    fn apply(&self, line: &str) -> Self::Output;
}


/// Yields the tokenized words of a line.
#[derive(Debug, Clone, Default)]
pub struct Tokenize {
    tokenizer: Tokenizer,
}

impl Tokenize {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }
}

impl LineTransform for Tokenize {
    type Output = Vec<String>;
    fn apply(&self, line: &str) -> Vec<String> {
        self.tokenizer.tokenize(line)
    }
}

/// Yields the sparse `(token id, count)` representation of a line. Tokens
/// unknown to the dictionary are dropped.
#[derive(Debug, Clone)]
pub struct Bow<'d> {
    tokenizer: Tokenizer,
    dictionary: &'d Dictionary,
}

impl<'d> Bow<'d> {
    pub fn new(tokenizer: Tokenizer, dictionary: &'d Dictionary) -> Self {
        Self { tokenizer, dictionary }
    }
}

impl<'d> LineTransform for Bow<'d> {
    type Output = Vec<(u32, u32)>;
    fn apply(&self, line: &str) -> Vec<(u32, u32)> {
        self.dictionary.doc2bow_frozen(&self.tokenizer.tokenize(line))
    }
}


/// A newline delimited text file, one document per line, read lazily.
#[derive(Debug, Clone)]
pub struct LineCorpus<T> {
    path: PathBuf,
    transform: T,
}

pub type SentenceStream = LineCorpus<Tokenize>;
pub type BowStream<'d> = LineCorpus<Bow<'d>>;

impl<T> LineCorpus<T> {

    pub fn with_transform<P: AsRef<Path>>(path: P, transform: T) -> Self {
        Self { path: path.as_ref().to_path_buf(), transform }
    }
}

impl LineCorpus<Tokenize> {
    pub fn new<P: AsRef<Path>>(path: P, tokenizer: Tokenizer) -> Self {
        Self::with_transform(path, Tokenize::new(tokenizer))
    }
}

impl<'d> LineCorpus<Bow<'d>> {
    pub fn new<P: AsRef<Path>>(path: P, tokenizer: Tokenizer, dictionary: &'d Dictionary) -> Self {
        Self::with_transform(path, Bow::new(tokenizer, dictionary))
    }
}

impl<T: LineTransform> Corpus for LineCorpus<T> {
    type Item = T::Output;
    type Iter<'a> = LineIter<'a, T> where Self: 'a;

    fn stream(&self) -> Result<LineIter<'_, T>> {
        let file = File::open(&self.path)?;
        // a directory opens fine on unix, fail here rather than on first read
        if file.metadata()?.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", self.path.display()),
            )));
        }
        Ok(LineIter {
            lines: BufReader::new(file).lines(),
            transform: &self.transform,
        })
    }
}

/// One pass over a [LineCorpus]. The file handle is released on drop.
pub struct LineIter<'a, T> {
    lines: Lines<BufReader<File>>,
    transform: &'a T,
}

impl<'a, T: LineTransform> Iterator for LineIter<'a, T> {
    type Item = Result<T::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(line.map(|line| self.transform.apply(&line)).map_err(Error::from))
    }
}


/// Raw documents held in memory.
#[derive(Debug, Clone)]
pub struct MemoryCorpus<T> {
    documents: Vec<String>,
    transform: T,
}

impl<T> MemoryCorpus<T> {

    pub fn with_transform<I, S>(documents: I, transform: T) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> {
        Self { documents: documents.into_iter().map(Into::into).collect(), transform }
    }
}

impl MemoryCorpus<Tokenize> {
    pub fn new<I, S>(documents: I, tokenizer: Tokenizer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> {
        Self::with_transform(documents, Tokenize::new(tokenizer))
    }
}

impl<T: LineTransform> Corpus for MemoryCorpus<T> {
    type Item = T::Output;
    type Iter<'a> = MemoryIter<'a, T> where Self: 'a;

    fn stream(&self) -> Result<MemoryIter<'_, T>> {
        Ok(MemoryIter { documents: self.documents.iter(), transform: &self.transform })
    }
}

pub struct MemoryIter<'a, T> {
    documents: slice::Iter<'a, String>,
    transform: &'a T,
}

impl<'a, T: LineTransform> Iterator for MemoryIter<'a, T> {
    type Item = Result<T::Output>;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.next().map(|doc| Ok(self.transform.apply(doc)))
    }
}


// records already in memory, e.g. tokenized sentences or bag-of-words docs
impl<T: Clone> Corpus for Vec<T> {
    type Item = T;
    type Iter<'a> = VecIter<'a, T> where Self: 'a;

    fn stream(&self) -> Result<VecIter<'_, T>> {
        Ok(VecIter { records: self.iter() })
    }
}

pub struct VecIter<'a, T> {
    records: slice::Iter<'a, T>,
}

impl<'a, T: Clone> Iterator for VecIter<'a, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|record| Ok(record.clone()))
    }
}


#[cfg(test)]
mod tests {

    use std::io::Write;
    use tempfile::NamedTempFile;
    use super::{BowStream, Corpus, MemoryCorpus, SentenceStream};
    use crate::dictionary::Dictionary;
    use crate::errors::{Error, Result};
    use crate::tokenizer::Tokenizer;

    fn corpus_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn collect<C: Corpus>(corpus: &C) -> Vec<C::Item> {
        corpus.stream().unwrap().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn sentences_are_repeatable() {
        let file = corpus_file(&[
            "Human machine interface for lab abc computer applications",
            "A survey of user opinion of computer system response time",
            "",
            "The EPS user interface management system",
        ]);
        let sentences = SentenceStream::new(file.path(), Tokenizer::english());

        let first = collect(&sentences);
        let second = collect(&sentences);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(first[0], vec!["human", "machine", "interface", "lab", "abc", "computer", "applications"]);
        assert!(first[2].is_empty());
    }

    #[test]
    fn bows_follow_the_dictionary() {
        let file = corpus_file(&["cat dog", "dog dog", "cat cat bird"]);
        let tokenizer = Tokenizer::english();
        let sentences = SentenceStream::new(file.path(), tokenizer.clone());
        let mut dictionary = Dictionary::from_corpus(&sentences).unwrap();
        dictionary.filter_rare(2);

        let bows = BowStream::new(file.path(), tokenizer, &dictionary);
        assert_eq!(dictionary.id_of("cat"), Some(0));
        assert_eq!(dictionary.id_of("dog"), Some(1));
        assert_eq!(dictionary.id_of("bird"), None);
        let expected = vec![vec![(0, 1), (1, 1)], vec![(1, 2)], vec![(0, 2)]];
        assert_eq!(collect(&bows), expected);
        assert_eq!(collect(&bows), expected);
    }

    #[test]
    fn missing_file_fails_at_stream_start() {
        let sentences = SentenceStream::new("/definitely/not/here.txt", Tokenizer::english());
        match sentences.stream() {
            Err(Error::Io(_)) => {},
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("missing file should not stream"),
        }
    }

    #[test]
    fn directory_fails_at_stream_start() {
        let dir = tempfile::tempdir().unwrap();
        let sentences = SentenceStream::new(dir.path(), Tokenizer::english());
        assert!(matches!(sentences.stream(), Err(Error::Io(_))));
    }

    #[test]
    fn memory_corpus_is_repeatable() {
        let corpus = MemoryCorpus::new(["Graph minors trees", "the intersection graph of paths"], Tokenizer::english());
        let first = collect(&corpus);
        assert_eq!(first, collect(&corpus));
        assert_eq!(first[1], vec!["intersection", "graph", "paths"]);
    }

    #[test]
    fn vectors_are_a_corpus() {
        let sentences = vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]];
        assert_eq!(collect(&sentences), sentences);
    }
}


use std::collections::{BTreeMap, HashMap, HashSet};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use crate::corpus::Corpus;
use crate::errors::{Error, Result};
use crate::files_handling;

/// Tokens appearing in fewer documents than this are pruned by default.
pub const DEFAULT_NO_BELOW: usize = 2;

/// Token to id mapping with document frequencies.
///
/// Ids are always the contiguous range `0..len()`, filtering compacts them
/// while preserving their relative order. Once built and filtered the
/// dictionary is meant to be shared read-only, see [Dictionary::doc2bow_frozen].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    token2id: HashMap<String, u32>,
    id2token: Vec<String>,
    dfs: Vec<usize>,  // number of documents containing the token
    cfs: Vec<usize>,  // number of occurrences in the whole corpus
    num_docs: usize,
    num_pos: usize,
    num_nnz: usize,
}

impl Dictionary {

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dictionary in one pass over a tokenized corpus.
    pub fn from_corpus<C>(corpus: &C) -> Result<Self>
    where
        C: Corpus<Item = Vec<String>> {
        let mut dictionary = Self::new();
        dictionary.add_documents(corpus)?;
        Ok(dictionary)
    }

    pub fn from_documents<I, D, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[S]>,
        S: AsRef<str> {
        let mut dictionary = Self::new();
        for doc in documents {
            dictionary.doc2bow(doc.as_ref(), true);
        }
        dictionary
    }

    pub fn add_documents<C>(&mut self, corpus: &C) -> Result<()>
    where
        C: Corpus<Item = Vec<String>> {
        for (i, doc) in corpus.stream()?.enumerate() {
            if i > 0 && i % 10000 == 0 {
                debug!("adding document #{} to {}", i, self);
            }
            self.doc2bow(&doc?, true);
        }
        info!("built {} from {} documents", self, self.num_docs);
        Ok(())
    }

    /// Converts tokens into sorted `(id, count)` pairs. With `allow_update`
    /// unknown tokens get fresh ids and the statistics are updated, otherwise
    /// unknown tokens are dropped.
    pub fn doc2bow<S: AsRef<str>>(&mut self, tokens: &[S], allow_update: bool) -> Vec<(u32, u32)> {
        if !allow_update {
            return self.doc2bow_frozen(tokens);
        }

        let counter = count_tokens(tokens);

        // new ids in sorted token order, continuing after the last one
        for token in counter.keys() {
            if !self.token2id.contains_key(*token) {
                let id = self.id2token.len() as u32;
                self.token2id.insert(token.to_string(), id);
                self.id2token.push(token.to_string());
                self.dfs.push(0);
                self.cfs.push(0);
            }
        }

        let bow = self.lookup(&counter);
        self.num_docs += 1;
        self.num_pos += tokens.len();
        self.num_nnz += bow.len();
        for (id, count) in &bow {
            self.dfs[*id as usize] += 1;
            self.cfs[*id as usize] += *count as usize;
        }
        bow
    }

    /// Read-only [Dictionary::doc2bow], unknown tokens are dropped.
    pub fn doc2bow_frozen<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<(u32, u32)> {
        self.lookup(&count_tokens(tokens))
    }

    fn lookup(&self, counter: &BTreeMap<&str, u32>) -> Vec<(u32, u32)> {
        let mut bow: Vec<(u32, u32)> = counter
            .iter()
            .filter_map(|(token, count)| self.token2id.get(*token).map(|id| (*id, *count)))
            .collect();
        bow.sort_unstable();
        bow
    }

    /// Keeps the tokens present in at least `no_below` documents and in at
    /// most `no_above` (a fraction of all documents) documents, then only the
    /// `keep_n` most frequent of those.
    pub fn filter_extremes(&mut self, no_below: usize, no_above: f64, keep_n: Option<usize>) -> Result<()> {

        if !(0.0..=1.0).contains(&no_above) {
            return Err(Error::InvalidParameter(format!("no_above must be within [0, 1], got {}", no_above)));
        }

        let no_above_abs = (no_above * self.num_docs as f64) as usize;
        let mut good_ids: Vec<u32> = (0..self.id2token.len() as u32)
            .filter(|id| {
                let df = self.dfs[*id as usize];
                no_below <= df && df <= no_above_abs
            })
            .collect();

        // most frequent first, stable so equal frequencies keep id order
        good_ids.sort_by(|a, b| self.dfs[*b as usize].cmp(&self.dfs[*a as usize]));
        if let Some(keep_n) = keep_n {
            good_ids.truncate(keep_n);
        }

        let before = self.len();
        self.keep_ids(&good_ids.into_iter().collect());
        info!(
            "kept {} of {} tokens (df >= {}, df <= {}, keep_n {:?}), resulting in {}",
            self.len(), before, no_below, no_above_abs, keep_n, self
        );
        Ok(())
    }

    /// Removes exactly the tokens whose document frequency is below `threshold`.
    pub fn filter_rare(&mut self, threshold: usize) {
        let good_ids: HashSet<u32> = (0..self.id2token.len() as u32)
            .filter(|id| self.dfs[*id as usize] >= threshold)
            .collect();
        let before = self.len();
        self.keep_ids(&good_ids);
        info!("pruned {} tokens with df < {}, resulting in {}", before - self.len(), threshold, self);
    }

    pub fn filter_tokens(&mut self, bad_ids: &[u32]) {
        let bad: HashSet<u32> = bad_ids.iter().copied().collect();
        let good: HashSet<u32> = (0..self.id2token.len() as u32).filter(|id| !bad.contains(id)).collect();
        self.keep_ids(&good);
    }

    fn keep_ids(&mut self, good: &HashSet<u32>) {
        let mut id2token = Vec::with_capacity(good.len());
        let mut dfs = Vec::with_capacity(good.len());
        let mut cfs = Vec::with_capacity(good.len());
        for (id, token) in std::mem::take(&mut self.id2token).into_iter().enumerate() {
            if good.contains(&(id as u32)) {
                id2token.push(token);
                dfs.push(self.dfs[id]);
                cfs.push(self.cfs[id]);
            }
        }
        self.id2token = id2token;
        self.dfs = dfs;
        self.cfs = cfs;
        self.compactify();
    }

    /// Reassigns ids to `0..len()` following the current token order.
    pub fn compactify(&mut self) {
        self.token2id = self.id2token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id as u32))
            .collect();
    }

    /// Token to document frequency. This, not the ids, is what other models
    /// consume to set up their own vocabulary.
    pub fn token_frequencies(&self) -> HashMap<String, usize> {
        self.id2token
            .iter()
            .zip(&self.dfs)
            .map(|(token, df)| (token.clone(), *df))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.id2token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2token.is_empty()
    }

    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.token2id.get(token).copied()
    }

    pub fn token_of(&self, id: u32) -> Option<&str> {
        self.id2token.get(id as usize).map(String::as_str)
    }

    pub fn doc_freq(&self, id: u32) -> Option<usize> {
        self.dfs.get(id as usize).copied()
    }

    pub fn collection_freq(&self, id: u32) -> Option<usize> {
        self.cfs.get(id as usize).copied()
    }

    pub fn tokens(&self) -> &[String] {
        &self.id2token
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn num_pos(&self) -> usize {
        self.num_pos
    }

    pub fn num_nnz(&self) -> usize {
        self.num_nnz
    }

    /// Writes `<output_dir>/<file_name>.bin.gz`.
    pub fn save(&self, output_dir: &str, file_name: &str) -> Result<()> {
        files_handling::save_output(output_dir, file_name, self)
    }

    /// Reads back a dictionary saved with [Dictionary::save], `file_path`
    /// given without extension.
    pub fn load(file_path: &str) -> Result<Self> {
        files_handling::read_input(file_path)
    }
}

impl std::fmt::Display for Dictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let head: Vec<&str> = self.id2token.iter().take(5).map(String::as_str).collect();
        let more = if self.len() > head.len() { ", ..." } else { "" };
        write!(f, "Dictionary<{} unique tokens: [{}{}]>", self.len(), head.join(", "), more)
    }
}

fn count_tokens<S: AsRef<str>>(tokens: &[S]) -> BTreeMap<&str, u32> {
    let mut counter: BTreeMap<&str, u32> = BTreeMap::new();
    for token in tokens {
        *counter.entry(token.as_ref()).or_insert(0) += 1;
    }
    counter
}

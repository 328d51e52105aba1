
use log::info;
use crate::corpus::Corpus;
use crate::dictionary::Dictionary;
use crate::errors::Result;

// weights this close to zero are dropped from the sparse output
const EPS: f64 = 1e-12;

/// Term frequency times inverse document frequency, `log2(num_docs / df)`,
/// with every document vector normalized to unit length.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    idfs: Vec<f64>,
}

impl TfidfModel {

    pub fn new(dictionary: &Dictionary) -> Self {
        let num_docs = dictionary.num_docs();
        let idfs = (0..dictionary.len() as u32)
            .map(|id| idf(num_docs, dictionary.doc_freq(id).unwrap_or(0)))
            .collect();
        info!("calculated idf weights for {} documents and {} features", num_docs, dictionary.len());
        Self { idfs }
    }

    pub fn idf(&self, id: u32) -> Option<f64> {
        self.idfs.get(id as usize).copied()
    }

    pub fn num_features(&self) -> usize {
        self.idfs.len()
    }

    pub fn transform(&self, bow: &[(u32, u32)]) -> Vec<(u32, f64)> {
        let weighted: Vec<(u32, f64)> = bow
            .iter()
            .filter_map(|(id, tf)| self.idf(*id).map(|idf| (*id, *tf as f64 * idf)))
            .filter(|(_, w)| w.abs() > EPS)
            .collect();

        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm <= EPS {
            return Vec::new();
        }
        weighted
            .into_iter()
            .map(|(id, w)| (id, w / norm))
            .filter(|(_, w)| w.abs() > EPS)
            .collect()
    }

    /// A weighted view over a bag-of-words corpus, as re-iterable as the
    /// corpus it wraps.
    pub fn apply<'a, C>(&'a self, corpus: &'a C) -> TfidfCorpus<'a, C>
    where
        C: Corpus<Item = Vec<(u32, u32)>> {
        TfidfCorpus { corpus, model: self }
    }
}

fn idf(num_docs: usize, df: usize) -> f64 {
    if df == 0 || num_docs == 0 {
        return 0.0;
    }
    (num_docs as f64 / df as f64).log2()
}


pub struct TfidfCorpus<'a, C> {
    corpus: &'a C,
    model: &'a TfidfModel,
}

impl<'a, C> Corpus for TfidfCorpus<'a, C>
where
    C: Corpus<Item = Vec<(u32, u32)>> {
    type Item = Vec<(u32, f64)>;
    type Iter<'b> = TfidfIter<'b, C::Iter<'b>> where Self: 'b;

    fn stream(&self) -> Result<Self::Iter<'_>> {
        Ok(TfidfIter { inner: self.corpus.stream()?, model: self.model })
    }
}

pub struct TfidfIter<'a, I> {
    inner: I,
    model: &'a TfidfModel,
}

impl<'a, I> Iterator for TfidfIter<'a, I>
where
    I: Iterator<Item = Result<Vec<(u32, u32)>>> {
    type Item = Result<Vec<(u32, f64)>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|bow| bow.map(|bow| self.model.transform(&bow)))
    }
}

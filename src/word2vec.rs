
use std::collections::HashMap;
use std::fmt::Display;
use std::time::Instant;
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Uniform;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use crate::corpus::Corpus;
use crate::errors::{Error, Result};
use crate::keyed_vectors::KeyedVectors;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// predict a word from the mean of its context
    Cbow,
    /// predict each context word from the word
    SkipGram,
}

#[derive(Clone, Debug)]
pub struct Word2VecParams {
    pub vector_size: usize,
    pub alpha: f32,
    pub min_alpha: f32,
    pub window: usize,
    pub min_count: usize,
    pub sample: f64,
    pub sg: Algorithm,
    pub negative: usize,
    pub epochs: usize,
    pub workers: usize,
    pub seed: u64,
    pub batch_words: usize,
}

impl Default for Word2VecParams {
    fn default() -> Self {
        Self {
            vector_size: 100,
            alpha: 0.025,
            min_alpha: 0.0001,
            window: 5,
            min_count: 5,
            sample: 1e-3,
            sg: Algorithm::Cbow,
            negative: 5,
            epochs: 5,
            workers: default_workers(),
            seed: 1,
            batch_words: 10000,
        }
    }
}

/// All cores but one, at least one.
pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

impl Display for Word2VecParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "word2vec hyper parameters:
        vector_size: {},
        alpha: {},
        min_alpha: {},
        window: {},
        min_count: {},
        sample: {},
        sg: {:?},
        negative: {},
        epochs: {},
        workers: {},
        seed: {},
        batch_words: {}",
        self.vector_size, self.alpha, self.min_alpha, self.window, self.min_count, self.sample,
        self.sg, self.negative, self.epochs, self.workers, self.seed, self.batch_words
        )
    }
}

impl Word2VecParams {

    pub fn validate(&self) -> Result<()> {
        let check = |ok: bool, msg: &str| if ok { Ok(()) } else { Err(Error::InvalidParameter(msg.to_string())) };
        check(self.vector_size > 0, "vector_size must be positive")?;
        check(self.window > 0, "window must be positive")?;
        check(self.negative > 0, "negative must be positive, hierarchical softmax is not supported")?;
        check(self.workers > 0, "workers must be positive")?;
        check(self.batch_words > 0, "batch_words must be positive")?;
        check(self.alpha > 0.0, "alpha must be positive")?;
        check(self.min_alpha >= 0.0 && self.min_alpha <= self.alpha, "min_alpha must be within [0, alpha]")?;
        check(self.sample >= 0.0, "sample must not be negative")?;
        Ok(())
    }
}


// the model's own vocabulary, ids are local to this model
struct Vocab {
    index_to_key: Vec<String>,
    key_to_index: HashMap<String, usize>,
    counts: Vec<usize>,
    keep_probs: Vec<f32>,   // downsampling, chance to keep an occurrence
    noise: WeightedIndex<f64>,  // negative sampling, count^0.75
}

pub struct Word2Vec {
    params: Word2VecParams,
    vocab: Option<Vocab>,
    syn0: Array2<f32>,
    syn1neg: Array2<f32>,
}

// gradients of one worker, rows it touched minus their value at job start
struct Deltas {
    syn0: Vec<(usize, Array1<f32>)>,
    syn1neg: Vec<(usize, Array1<f32>)>,
    loss: f64,
    pairs: usize,
}

#[derive(Default)]
struct Progress {
    epoch_loss: f64,
    pairs: usize,
    sentences: usize,
    words: usize,
}

impl Word2Vec {

    pub fn new(params: Word2VecParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            vocab: None,
            syn0: Array2::zeros((0, 0)),
            syn1neg: Array2::zeros((0, 0)),
        })
    }

    /// Infers the vocabulary by counting every token occurrence of a
    /// tokenized corpus, then continues as [Word2Vec::build_vocab_from_freq].
    pub fn build_vocab<C>(&mut self, corpus: &C) -> Result<()>
    where
        C: Corpus<Item = Vec<String>> {
        let mut word_freq: HashMap<String, usize> = HashMap::new();
        let mut sentences = 0;
        for sentence in corpus.stream()? {
            for word in sentence? {
                *word_freq.entry(word).or_insert(0) += 1;
            }
            sentences += 1;
        }
        info!("collected {} word types from {} sentences", word_freq.len(), sentences);
        self.build_vocab_from_freq(&word_freq)
    }

    /// Sets up the vocabulary from a prebuilt token to frequency mapping,
    /// skipping the counting pass. Only tokens of the mapping with a
    /// frequency of at least `min_count` are kept, no token is ever added.
    /// Resets the weights.
    pub fn build_vocab_from_freq(&mut self, word_freq: &HashMap<String, usize>) -> Result<()> {

        let mut retained: Vec<(&String, usize)> = word_freq
            .iter()
            .filter(|(_, count)| **count >= self.params.min_count.max(1))
            .map(|(word, count)| (word, *count))
            .collect();
        if retained.is_empty() {
            return Err(Error::EmptyVocabulary("build the word2vec vocabulary"));
        }

        // most frequent first, ties by token so ids do not depend on hashing
        retained.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let index_to_key: Vec<String> = retained.iter().map(|(word, _)| word.to_string()).collect();
        let counts: Vec<usize> = retained.iter().map(|(_, count)| *count).collect();
        let key_to_index: HashMap<String, usize> = index_to_key
            .iter()
            .enumerate()
            .map(|(i, word)| (word.clone(), i))
            .collect();

        let retain_total: usize = counts.iter().sum();
        let keep_probs = keep_probabilities(&counts, retain_total, self.params.sample);
        let noise = WeightedIndex::new(counts.iter().map(|count| (*count as f64).powf(0.75)))
            .map_err(|e| Error::InvalidParameter(format!("negative sampling distribution: {}", e)))?;

        let vocab_size = index_to_key.len();
        let dim = self.params.vector_size;
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        self.syn0 = Array2::random_using((vocab_size, dim), Uniform::new(-0.5, 0.5), &mut rng) / dim as f32;
        self.syn1neg = Array2::zeros((vocab_size, dim));

        info!(
            "word2vec vocabulary of {} tokens (of {} supplied) covering {} occurrences",
            vocab_size, word_freq.len(), retain_total
        );
        self.vocab = Some(Vocab { index_to_key, key_to_index, counts, keep_probs, noise });
        Ok(())
    }

    /// Trains over `epochs` full passes of the corpus. `total_examples` is the
    /// number of sentences in one pass, used to decay the learning rate
    /// linearly from `alpha` to `min_alpha`.
    pub fn train<C>(&mut self, corpus: &C, total_examples: usize, epochs: usize) -> Result<()>
    where
        C: Corpus<Item = Vec<String>> {

        if self.vocab.is_none() {
            return Err(Error::NotBuilt("build_vocab", "train"));
        }
        if total_examples == 0 {
            return Err(Error::InvalidParameter("total_examples must be positive".to_string()));
        }

        let pool = ThreadPoolBuilder::new().num_threads(self.params.workers).build()?;
        let total_work = (epochs * total_examples) as f32;
        let mut done = 0usize;
        let mut job_seed = self.params.seed;

        info!("training {:?} on {} sentences x {} epochs with {} workers", self.params.sg, total_examples, epochs, self.params.workers);
        for epoch in 0..epochs {

            let timer = Instant::now();
            let mut progress = Progress::default();
            let mut job: Vec<Vec<usize>> = Vec::new();
            let mut job_words = 0;

            for sentence in corpus.stream()? {
                let ids = self.lookup(&sentence?);
                job_words += ids.len();
                job.push(ids);
                if job_words >= self.params.batch_words {
                    let alpha = self.learning_rate(done as f32 / total_work);
                    job_seed = job_seed.wrapping_add(1);
                    self.run_job(&pool, &job, alpha, job_seed, &mut progress);
                    done += job.len();
                    job.clear();
                    job_words = 0;
                }
            }
            if !job.is_empty() {
                let alpha = self.learning_rate(done as f32 / total_work);
                job_seed = job_seed.wrapping_add(1);
                self.run_job(&pool, &job, alpha, job_seed, &mut progress);
                done += job.len();
            }

            let loss = if progress.pairs > 0 { progress.epoch_loss / progress.pairs as f64 } else { 0.0 };
            info!(
                "finished epoch {}, {} sentences, {} effective words, loss is {:.5}, took: {} seconds...",
                epoch, progress.sentences, progress.words, loss, timer.elapsed().as_secs()
            );
        }

        if done != epochs * total_examples {
            debug!("expected {} sentences in total, processed {}", epochs * total_examples, done);
        }
        Ok(())
    }

    fn learning_rate(&self, progress: f32) -> f32 {
        let alpha = self.params.alpha - (self.params.alpha - self.params.min_alpha) * progress;
        alpha.max(self.params.min_alpha)
    }

    fn lookup(&self, sentence: &[String]) -> Vec<usize> {
        match &self.vocab {
            Some(vocab) => sentence.iter().filter_map(|word| vocab.key_to_index.get(word).copied()).collect(),
            None => Vec::new(),
        }
    }

    fn run_job(&mut self, pool: &ThreadPool, job: &[Vec<usize>], alpha: f32, seed: u64, progress: &mut Progress) {
        let vocab = match &self.vocab {
            Some(vocab) => vocab,
            None => return,
        };

        // each worker walks its chunk sequentially against a private overlay
        // of the weights, the overlays are merged once the job is done
        let chunk_size = (job.len() + self.params.workers - 1) / self.params.workers;
        let (syn0, syn1neg, params) = (&self.syn0, &self.syn1neg, &self.params);
        let all_deltas: Vec<Deltas> = pool.install(|| {
            job.par_chunks(chunk_size.max(1))
                .enumerate()
                .map(|(i, chunk)| {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_mul(0x9E37_79B9).wrapping_add(i as u64));
                    train_chunk(syn0, syn1neg, vocab, params, chunk, alpha, &mut rng)
                })
                .collect()
        });

        for deltas in all_deltas {
            for (id, delta) in deltas.syn0 {
                let mut row = self.syn0.row_mut(id);
                row += &delta;
            }
            for (id, delta) in deltas.syn1neg {
                let mut row = self.syn1neg.row_mut(id);
                row += &delta;
            }
            progress.epoch_loss += deltas.loss;
            progress.pairs += deltas.pairs;
        }
        progress.sentences += job.len();
        progress.words += job.iter().map(Vec::len).sum::<usize>();
        debug!("job of {} sentences done, alpha {:.6}", job.len(), alpha);
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.as_ref().map_or(0, |vocab| vocab.index_to_key.len())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.vocab.as_ref().map_or(false, |vocab| vocab.key_to_index.contains_key(word))
    }

    pub fn word_count(&self, word: &str) -> Option<usize> {
        let vocab = self.vocab.as_ref()?;
        vocab.key_to_index.get(word).map(|i| vocab.counts[*i])
    }

    pub fn words(&self) -> &[String] {
        match &self.vocab {
            Some(vocab) => &vocab.index_to_key,
            None => &[],
        }
    }

    /// The trained word vectors.
    pub fn wv(&self) -> Result<KeyedVectors> {
        let vocab = self.vocab.as_ref().ok_or(Error::NotBuilt("build_vocab", "wv"))?;
        KeyedVectors::new(vocab.index_to_key.clone(), self.syn0.clone(), vocab.counts.clone())
    }
}

fn keep_probabilities(counts: &[usize], retain_total: usize, sample: f64) -> Vec<f32> {
    let threshold_count = if sample == 0.0 {
        retain_total as f64
    } else if sample < 1.0 {
        sample * retain_total as f64
    } else {
        sample * (3.0 + 5f64.sqrt()) / 2.0
    };
    counts
        .iter()
        .map(|count| {
            let v = *count as f64;
            (((v / threshold_count).sqrt() + 1.0) * (threshold_count / v)).min(1.0) as f32
        })
        .collect()
}


// rows read through here see this worker's own updates
struct Overlay<'a> {
    base: &'a Array2<f32>,
    rows: HashMap<usize, Array1<f32>>,
}

impl<'a> Overlay<'a> {

    fn new(base: &'a Array2<f32>) -> Self {
        Self { base, rows: HashMap::new() }
    }

    fn get(&self, id: usize) -> ArrayView1<'_, f32> {
        match self.rows.get(&id) {
            Some(row) => row.view(),
            None => self.base.row(id),
        }
    }

    fn get_mut(&mut self, id: usize) -> &mut Array1<f32> {
        let base = self.base;
        self.rows.entry(id).or_insert_with(|| base.row(id).to_owned())
    }

    fn into_deltas(self) -> Vec<(usize, Array1<f32>)> {
        let base = self.base;
        self.rows.into_iter().map(|(id, row)| (id, row - &base.row(id))).collect()
    }
}

fn train_chunk(
    syn0: &Array2<f32>,
    syn1neg: &Array2<f32>,
    vocab: &Vocab,
    params: &Word2VecParams,
    chunk: &[Vec<usize>],
    alpha: f32,
    rng: &mut StdRng) -> Deltas {

    let mut syn0 = Overlay::new(syn0);
    let mut syn1neg = Overlay::new(syn1neg);
    let mut loss = 0.0;
    let mut pairs = 0;

    for sentence in chunk {

        let words: Vec<usize> = sentence
            .iter()
            .copied()
            .filter(|w| vocab.keep_probs[*w] >= rng.gen::<f32>())
            .collect();

        for (pos, word) in words.iter().enumerate() {
            let span = params.window - rng.gen_range(0..params.window);
            let start = pos.saturating_sub(span);
            let end = (pos + span + 1).min(words.len());
            let context = (start..end).filter(|p| *p != pos).map(|p| words[p]);

            match params.sg {
                Algorithm::SkipGram => {
                    for ctx in context {
                        let l1 = syn0.get(ctx).to_owned();
                        let neu1e = train_negative(&mut syn1neg, vocab, params.negative, *word, &l1, alpha, rng, &mut loss);
                        *syn0.get_mut(ctx) += &neu1e;
                        pairs += 1;
                    }
                },
                Algorithm::Cbow => {
                    let context: Vec<usize> = context.collect();
                    if context.is_empty() {
                        continue;
                    }
                    let mut l1: Array1<f32> = Array1::zeros(params.vector_size);
                    for ctx in &context {
                        l1 += &syn0.get(*ctx);
                    }
                    l1 /= context.len() as f32;
                    let neu1e = train_negative(&mut syn1neg, vocab, params.negative, *word, &l1, alpha, rng, &mut loss);
                    for ctx in &context {
                        *syn0.get_mut(*ctx) += &neu1e;
                    }
                    pairs += 1;
                },
            }
        }
    }

    Deltas { syn0: syn0.into_deltas(), syn1neg: syn1neg.into_deltas(), loss, pairs }
}

// one positive target and `negative` noise targets, returns the error to
// propagate back into the input vectors
#[allow(clippy::too_many_arguments)]
fn train_negative(
    syn1neg: &mut Overlay,
    vocab: &Vocab,
    negative: usize,
    word: usize,
    l1: &Array1<f32>,
    alpha: f32,
    rng: &mut StdRng,
    loss: &mut f64) -> Array1<f32> {

    let mut neu1e: Array1<f32> = Array1::zeros(l1.len());
    for d in 0..=negative {
        let (target, label) = if d == 0 {
            (word, 1.0)
        } else {
            let target = vocab.noise.sample(rng);
            if target == word {
                continue;
            }
            (target, 0.0)
        };

        let f = sigmoid(l1.dot(&syn1neg.get(target)));
        let clipped = f.clamp(1e-7, 1.0 - 1e-7) as f64;
        *loss -= if label > 0.0 { clipped.ln() } else { (1.0 - clipped).ln() };

        let g = (label - f) * alpha;
        neu1e.scaled_add(g, &syn1neg.get(target));
        syn1neg.get_mut(target).scaled_add(g, l1);
    }
    neu1e
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}


// latent semantic indexing: a truncated svd of the (weighted) term-document
// matrix. The corpus is never held in memory, the decomposition is a
// randomized range finder that streams the corpus once per pass:
//
//   pass 1            y = A * omega            (omega gaussian, one row per doc)
//   power iterations  y = A * (A^T * orth(y))
//   last pass         B B^T with B = Q^T A, a small (samples x samples) matrix
//
// the eigen decomposition of B B^T gives the singular values and, through Q,
// the left singular vectors. This is why the corpus must be re-iterable.

use log::{debug, info};
use ndarray::{Array1, Array2, Axis, s};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_stats::QuantileExt;
use crate::corpus::Corpus;
use crate::errors::{Error, Result};

const EPS: f64 = 1e-12;
const MAX_SWEEPS: usize = 100;

#[derive(Clone, Debug)]
pub struct LsiParams {
    pub power_iters: usize,
    pub extra_samples: usize,
    pub seed: u64,
}

impl Default for LsiParams {
    fn default() -> Self {
        Self { power_iters: 2, extra_samples: 100, seed: 1 }
    }
}


pub struct LsiModel {
    num_topics: usize,
    num_terms: usize,
    u: Array2<f64>,  // (num_terms, num_topics), left singular vectors
    s: Array1<f64>,  // singular values, descending
}

impl LsiModel {

    pub fn train<C>(corpus: &C, num_terms: usize, num_topics: usize, params: &LsiParams) -> Result<LsiModel>
    where
        C: Corpus<Item = Vec<(u32, f64)>> {

        if num_topics == 0 {
            return Err(Error::InvalidParameter("num_topics must be positive".to_string()));
        }
        if num_terms == 0 {
            return Err(Error::EmptyVocabulary("train lsi"));
        }

        let samples = (num_topics + params.extra_samples).min(num_terms);
        info!("computing truncated svd of a {} terms matrix, {} topics, {} samples", num_terms, num_topics, samples);
        let mut rng = StdRng::seed_from_u64(params.seed);

        // range of A from a random projection
        let mut y: Array2<f64> = Array2::zeros((num_terms, samples));
        let mut num_docs = 0;
        for doc in corpus.stream()? {
            let omega: Array1<f64> = Array1::random_using(samples, StandardNormal, &mut rng);
            for (id, w) in doc? {
                if (id as usize) < num_terms {
                    y.row_mut(id as usize).scaled_add(w, &omega);
                }
            }
            num_docs += 1;
        }
        if num_docs == 0 {
            return Err(Error::EmptyCorpus("train lsi"));
        }
        let mut q = orthonormalize(y);

        for i in 0..params.power_iters {
            let mut y: Array2<f64> = Array2::zeros((num_terms, samples));
            for doc in corpus.stream()? {
                let doc = doc?;
                let z = project(&q, &doc);
                for (id, w) in &doc {
                    if (*id as usize) < num_terms {
                        y.row_mut(*id as usize).scaled_add(*w, &z);
                    }
                }
            }
            q = orthonormalize(y);
            debug!("finished power iteration {} / {}", i + 1, params.power_iters);
        }

        let mut bbt: Array2<f64> = Array2::zeros((samples, samples));
        for doc in corpus.stream()? {
            let b = project(&q, &doc?).insert_axis(Axis(1));
            bbt += &b.dot(&b.t());
        }

        let (eigvals, eigvecs) = symmetric_eigen(bbt);
        let mut order: Vec<usize> = (0..samples).collect();
        order.sort_by(|a, b| eigvals[*b].total_cmp(&eigvals[*a]));
        order.truncate(num_topics);

        let k = order.len();
        let s: Array1<f64> = order.iter().map(|i| eigvals[*i].max(0.0).sqrt()).collect();
        let u = q.dot(&eigvecs.select(Axis(1), &order));
        info!("lsi over {} documents done, top singular value {:.4}", num_docs, s.get(0).copied().unwrap_or(0.0));

        Ok(LsiModel { num_topics: k, num_terms, u, s })
    }

    /// Coordinates of a weighted document in topic space.
    pub fn transform(&self, doc: &[(u32, f64)]) -> Array1<f64> {
        project(&self.u, doc)
    }

    pub fn dominant_topic(&self, doc: &[(u32, f64)]) -> Result<usize> {
        let projection = self.transform(doc).mapv(f64::abs);
        Ok(projection.argmax()?)
    }

    /// The `topn` terms with the largest absolute weight in `topic`.
    pub fn show_topic(&self, topic: usize, topn: usize) -> Vec<(u32, f64)> {
        if topic >= self.num_topics {
            return Vec::new();
        }
        let column = self.u.slice(s![.., topic]);
        let mut terms: Vec<(u32, f64)> = column.iter().enumerate().map(|(id, w)| (id as u32, *w)).collect();
        terms.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        terms.truncate(topn);
        terms
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn num_terms(&self) -> usize {
        self.num_terms
    }

    pub fn singular_values(&self) -> &Array1<f64> {
        &self.s
    }

    pub fn projection(&self) -> &Array2<f64> {
        &self.u
    }
}


// rows of m picked by the sparse doc, weighted and summed: m^T * doc
fn project(m: &Array2<f64>, doc: &[(u32, f64)]) -> Array1<f64> {
    let mut out = Array1::zeros(m.ncols());
    for (id, w) in doc {
        if (*id as usize) < m.nrows() {
            out.scaled_add(*w, &m.row(*id as usize));
        }
    }
    out
}

// modified gram-schmidt over the columns, degenerate columns become zero
fn orthonormalize(mut m: Array2<f64>) -> Array2<f64> {
    for j in 0..m.ncols() {
        for i in 0..j {
            let qi = m.column(i).to_owned();
            let proj = qi.dot(&m.column(j));
            m.column_mut(j).scaled_add(-proj, &qi);
        }
        let norm = m.column(j).dot(&m.column(j)).sqrt();
        if norm > EPS {
            m.column_mut(j).mapv_inplace(|x| x / norm);
        } else {
            m.column_mut(j).fill(0.0);
        }
    }
    m
}

// cyclic jacobi rotations, returns (eigenvalues, eigenvectors as columns)
fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v: Array2<f64> = Array2::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt().max(EPS);

    for _sweep in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in p + 1..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off.sqrt() <= EPS * scale {
            break;
        }

        for p in 0..n {
            for q in p + 1..n {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}


#[cfg(test)]
mod tests {

    use ndarray::{array, Array2};
    use super::{orthonormalize, symmetric_eigen, LsiModel, LsiParams};
    use crate::corpus::{Bow, MemoryCorpus};
    use crate::dictionary::Dictionary;
    use crate::tfidf::TfidfModel;
    use crate::tokenizer::Tokenizer;

    #[test]
    fn jacobi_test() {
        let (vals, vecs) = symmetric_eigen(array![[2.0, 1.0], [1.0, 2.0]]);
        let mut sorted = vals.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert!((sorted[0] - 3.0).abs() < 1e-9);
        assert!((sorted[1] - 1.0).abs() < 1e-9);
        // eigenvectors are orthonormal
        let gram = vecs.t().dot(&vecs);
        assert!((&gram - &Array2::<f64>::eye(2)).iter().all(|x| x.abs() < 1e-9));
    }

    #[test]
    fn orthonormalize_test() {
        let q = orthonormalize(array![[1.0, 1.0, 2.0], [0.0, 1.0, 2.0], [1.0, 0.0, 2.0]]);
        let gram = q.t().dot(&q);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - expected).abs() < 1e-9, "gram {:?}", gram);
            }
        }
    }

    #[test]
    fn diagonal_matrix_test() {
        // A = diag(3, 2, 1), one term per document
        let corpus: Vec<Vec<(u32, f64)>> = vec![vec![(0, 3.0)], vec![(1, 2.0)], vec![(2, 1.0)]];
        let lsi = LsiModel::train(&corpus, 3, 2, &LsiParams::default()).unwrap();
        assert_eq!(lsi.num_topics(), 2);
        let s = lsi.singular_values();
        assert!((s[0] - 3.0).abs() < 1e-6);
        assert!((s[1] - 2.0).abs() < 1e-6);

        assert_eq!(lsi.show_topic(0, 1)[0].0, 0);
        assert_eq!(lsi.show_topic(1, 1)[0].0, 1);
        assert_eq!(lsi.dominant_topic(&[(1, 1.0)]).unwrap(), 1);
        assert!(lsi.show_topic(5, 3).is_empty());
    }

    #[test]
    fn text_corpus_test() {
        let docs = [
            "Human machine interface for lab abc computer applications",
            "A survey of user opinion of computer system response time",
            "The EPS user interface management system",
            "System and human system engineering testing of EPS",
            "Relation of user perceived response time to error measurement",
            "The generation of random binary unordered trees",
            "The intersection graph of paths in trees",
            "Graph minors IV Widths of trees and well quasi ordering",
            "Graph minors A survey",
        ];
        let tokenizer = Tokenizer::english();
        let mut dictionary = Dictionary::from_corpus(&MemoryCorpus::new(docs, tokenizer.clone())).unwrap();
        dictionary.filter_rare(2);
        let tfidf = TfidfModel::new(&dictionary);
        let bows = MemoryCorpus::with_transform(docs, Bow::new(tokenizer, &dictionary));

        let lsi = LsiModel::train(&tfidf.apply(&bows), dictionary.len(), 2, &LsiParams::default()).unwrap();
        let s = lsi.singular_values();
        assert_eq!(s.len(), 2);
        assert!(s[0] >= s[1] && s[1] >= 0.0);
        assert_eq!(lsi.projection().dim(), (dictionary.len(), 2));

        // the graph documents and the computer documents fall apart
        let graph = lsi.transform(&tfidf.transform(&dictionary.doc2bow_frozen(&["graph", "minors", "trees"])));
        let human = lsi.transform(&tfidf.transform(&dictionary.doc2bow_frozen(&["human", "interface", "computer"])));
        let cos = graph.dot(&human) / (graph.dot(&graph).sqrt() * human.dot(&human).sqrt());
        assert!(cos < 0.5, "cosine {}", cos);
    }

    #[test]
    fn invalid_arguments() {
        let corpus: Vec<Vec<(u32, f64)>> = vec![vec![(0, 1.0)]];
        assert!(LsiModel::train(&corpus, 1, 0, &LsiParams::default()).is_err());
        assert!(LsiModel::train(&corpus, 0, 2, &LsiParams::default()).is_err());
        let empty: Vec<Vec<(u32, f64)>> = Vec::new();
        assert!(LsiModel::train(&empty, 3, 2, &LsiParams::default()).is_err());
    }
}

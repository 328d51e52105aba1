
use std::collections::HashMap;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use crate::errors::{Error, Result};

/// Trained word vectors with similarity queries.
pub struct KeyedVectors {
    index_to_key: Vec<String>,
    key_to_index: HashMap<String, usize>,
    vectors: Array2<f32>,
    counts: Vec<usize>,
    unit: Array2<f32>,  // rows scaled to unit l2 norm, for cosine queries
}

impl KeyedVectors {

    pub fn new(index_to_key: Vec<String>, vectors: Array2<f32>, counts: Vec<usize>) -> Result<KeyedVectors> {

        if vectors.dim().0 != index_to_key.len() || counts.len() != index_to_key.len() {
            return Err(Error::InvalidParameter(format!(
                "inconsistent number of entries, {} keys, {} counts and {} vectors",
                index_to_key.len(), counts.len(), vectors.dim().0
            )));
        }

        let key_to_index = index_to_key
            .iter()
            .enumerate()
            .map(|(i, key)| (key.to_owned(), i))
            .collect();

        // zero rows stay zero
        let mut unit = vectors.clone();
        for mut row in unit.axis_iter_mut(Axis(0)) {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|a| a / norm);
            }
        }

        Ok(Self { index_to_key, key_to_index, vectors, counts, unit })
    }

    /// Vectors loaded back from disk, where the counts are not kept.
    pub fn from_saved(index_to_key: Vec<String>, vectors: Array2<f32>) -> Result<KeyedVectors> {
        let counts = vec![0; index_to_key.len()];
        Self::new(index_to_key, vectors, counts)
    }

    pub fn len(&self) -> usize {
        self.index_to_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_key.is_empty()
    }

    pub fn vector_size(&self) -> usize {
        self.vectors.dim().1
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key_to_index.contains_key(key)
    }

    pub fn index_to_key(&self) -> &[String] {
        &self.index_to_key
    }

    pub fn vectors(&self) -> &Array2<f32> {
        &self.vectors
    }

    pub fn count(&self, key: &str) -> Option<usize> {
        self.key_to_index.get(key).map(|i| self.counts[*i])
    }

    fn index(&self, key: &str) -> Result<usize> {
        self.key_to_index.get(key).copied().ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    pub fn get_vector(&self, key: &str) -> Result<ArrayView1<'_, f32>> {
        Ok(self.vectors.row(self.index(key)?))
    }

    /// Cosine similarity of two keys.
    pub fn similarity(&self, a: &str, b: &str) -> Result<f32> {
        let (a, b) = (self.index(a)?, self.index(b)?);
        Ok(self.unit.row(a).dot(&self.unit.row(b)))
    }

    /// `b - a + c`, on unit vectors: a is to b as c is to ?
    pub fn analogy_vector(&self, inputs: [&str; 3]) -> Result<Array1<f32>> {
        let mut vecs: Vec<ArrayView1<f32>> = Vec::with_capacity(3);
        for key in inputs {
            vecs.push(self.unit.row(self.index(key)?));
        }
        Ok(&vecs[1] - &vecs[0] + &vecs[2])
    }

    pub fn analogy(&self, inputs: [&str; 3], topn: usize) -> Result<Vec<(String, f32)>> {
        let vec = self.analogy_vector(inputs)?;
        self.most_similar_to_vector(&vec, topn, &inputs)
    }

    /// The `topn` keys closest to `key`, the key itself excluded.
    pub fn most_similar(&self, key: &str, topn: usize) -> Result<Vec<(String, f32)>> {
        let vec = self.unit.row(self.index(key)?).to_owned();
        self.most_similar_to_vector(&vec, topn, &[key])
    }

    pub fn most_similar_to_vector(&self, vec: &Array1<f32>, topn: usize, exclude: &[&str]) -> Result<Vec<(String, f32)>> {

        let norm = vec.dot(vec).sqrt();
        if norm == 0.0 {
            return Err(Error::InvalidParameter("cannot rank against a zero vector".to_string()));
        }

        let scores = self.unit.dot(vec) / norm; // of size vocab
        let mut indexed_scores: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(i, _)| !exclude.contains(&self.index_to_key[*i].as_str()))
            .collect();

        // most similar first
        indexed_scores.sort_by(|(_i, s), (_j, t)| t.total_cmp(s));
        indexed_scores.truncate(topn);

        Ok(indexed_scores
            .into_iter()
            .map(|(i, score)| (self.index_to_key[i].clone(), score))
            .collect())
    }
}


#[cfg(test)]
mod tests {

    use ndarray::array;
    use super::KeyedVectors;
    use crate::errors::Error;

    fn toy() -> KeyedVectors {
        let keys = ["king", "queen", "man", "woman", "apple"].iter().map(|k| k.to_string()).collect();
        let vectors = array![
            [1.0, 1.0, 0.0],
            [1.0, -1.0, 0.0],
            [0.0, 1.0, 0.1],
            [0.0, -1.0, 0.1],
            [0.0, 0.0, 5.0],
        ];
        KeyedVectors::new(keys, vectors, vec![5, 4, 3, 2, 1]).unwrap()
    }

    #[test]
    fn similarity_test() {
        let wv = toy();
        assert!((wv.similarity("king", "king").unwrap() - 1.0).abs() < 1e-6);
        assert!(wv.similarity("king", "apple").unwrap().abs() < 1e-6);
        assert!(matches!(wv.similarity("king", "pear"), Err(Error::KeyNotFound(_))));
        assert_eq!(wv.count("queen"), Some(4));
        assert_eq!(wv.get_vector("apple").unwrap().to_vec(), vec![0.0, 0.0, 5.0]);
        assert!(matches!(wv.get_vector("pear"), Err(Error::KeyNotFound(_))));
        assert_eq!(wv.vector_size(), 3);
    }

    #[test]
    fn most_similar_test() {
        let wv = toy();
        let similar = wv.most_similar("man", 2).unwrap();
        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].0, "king");
        assert!(similar.iter().all(|(key, _)| key != "man"));
        assert!(similar[0].1 >= similar[1].1);
    }

    #[test]
    fn analogies_test() {
        // man is to king as woman is to ?
        let wv = toy();
        let analogies = wv.analogy(["man", "king", "woman"], 1).unwrap();
        assert_eq!(analogies[0].0, "queen");
    }

    #[test]
    fn inconsistent_sizes() {
        let keys = vec!["a".to_string()];
        assert!(KeyedVectors::new(keys.clone(), array![[1.0], [2.0]], vec![1]).is_err());
        assert!(KeyedVectors::from_saved(keys, array![[1.0]]).is_ok());
    }
}

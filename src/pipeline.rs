
use std::time::Instant;
use log::info;
use crate::config::Params;
use crate::corpus::{BowStream, SentenceStream};
use crate::dictionary::Dictionary;
use crate::errors::Result;
use crate::files_handling;
use crate::lsi::LsiModel;
use crate::tfidf::TfidfModel;
use crate::tokenizer::Tokenizer;
use crate::word2vec::Word2Vec;

/// Every model built by [Pipeline::run], the dictionary included.
pub struct PipelineOutput {
    pub dictionary: Dictionary,
    pub tfidf: TfidfModel,
    pub lsi: LsiModel,
    pub word2vec: Word2Vec,
}

pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure of 3 steps -
    // -> vocabulary building (and pruning)
    // -> tf-idf and lsi over the bag-of-words stream
    // -> word2vec, with its vocabulary taken from the dictionary

    pub fn run(params: &Params) -> Result<PipelineOutput> {

        info!("{}", params);
        let tokenizer = Tokenizer::english();
        let sentences = SentenceStream::new(&params.corpus_file, tokenizer.clone());

        let timer = Instant::now();
        info!("starting vocab building...");
        let dictionary = Self::build_dictionary(&sentences, params)?;
        info!("finished creation of vocab, took {} seconds ...", timer.elapsed().as_secs());

        let timer = Instant::now();
        info!("starting lsi part...");
        let tfidf = TfidfModel::new(&dictionary);
        let bows = BowStream::new(&params.corpus_file, tokenizer, &dictionary);
        let lsi = LsiModel::train(&tfidf.apply(&bows), dictionary.len(), params.num_topics, &params.lsi)?;
        info!("finished lsi with {} topics, took {} seconds ...", lsi.num_topics(), timer.elapsed().as_secs());

        // only tokens and their frequencies are handed over, ids stay local
        let timer = Instant::now();
        info!("starting word2vec part...");
        let mut word2vec = Word2Vec::new(params.word2vec.clone())?;
        word2vec.build_vocab_from_freq(&dictionary.token_frequencies())?;
        word2vec.train(&sentences, dictionary.num_docs(), params.word2vec.epochs)?;
        info!("finished training, took {} seconds ...", timer.elapsed().as_secs());

        if let Some(output_dir) = &params.output_dir {
            let wv = word2vec.wv()?;
            dictionary.save(output_dir, "dictionary")?;
            files_handling::save_output(output_dir, "vecs", wv.vectors())?;
            files_handling::save_output(output_dir, "words", &wv.index_to_key().to_vec())?;
            info!("saved dictionary, vecs and words to {}", output_dir);
        }

        Ok(PipelineOutput { dictionary, tfidf, lsi, word2vec })
    }

    /// One pass over the corpus, then pruning. Without `no_above` or `keep_n`
    /// only the rare tokens are pruned.
    pub fn build_dictionary(sentences: &SentenceStream, params: &Params) -> Result<Dictionary> {
        let mut dictionary = Dictionary::from_corpus(sentences)?;
        if params.no_above.is_some() || params.keep_n.is_some() {
            dictionary.filter_extremes(params.no_below, params.no_above.unwrap_or(1.0), params.keep_n)?;
        } else {
            dictionary.filter_rare(params.no_below);
        }
        Ok(dictionary)
    }
}


#[cfg(test)]
mod tests {

    use std::io::Write;
    use tempfile::NamedTempFile;
    use super::Pipeline;
    use crate::config::Config;
    use crate::corpus::SentenceStream;
    use crate::tokenizer::Tokenizer;
    use serde_json::json;

    fn corpus_file(lines: &[&str]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        f
    }

    #[test]
    fn rare_tokens_are_pruned_by_default() {
        let f = corpus_file(&["cat dog", "dog dog", "cat cat cat", "bird"]);
        let params = Config::from_json(&json!({"corpus_file": f.path().display().to_string()}))
            .unwrap()
            .get_params();
        let sentences = SentenceStream::new(f.path(), Tokenizer::english());
        let dictionary = Pipeline::build_dictionary(&sentences, &params).unwrap();
        let mut tokens = dictionary.tokens().to_vec();
        tokens.sort();
        assert_eq!(tokens, vec!["cat", "dog"]);
        assert_eq!(dictionary.num_docs(), 4);
    }

    #[test]
    fn extremes_when_asked() {
        let f = corpus_file(&["cat dog", "dog mouse", "cat dog mouse", "dog"]);
        let json = json!({"corpus_file": f.path().display().to_string(), "no_above": 0.75});
        let params = Config::from_json(&json).unwrap().get_params();
        let sentences = SentenceStream::new(f.path(), Tokenizer::english());
        let dictionary = Pipeline::build_dictionary(&sentences, &params).unwrap();

        // dog is in all 4 documents, above 0.75 * 4
        let mut tokens = dictionary.tokens().to_vec();
        tokens.sort();
        assert_eq!(tokens, vec!["cat", "mouse"]);
    }
}

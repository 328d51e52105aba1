use std::collections::HashSet;
use std::io::Write;
use ndarray::Array2;
use serde_json::json;
use tempfile::{tempdir, NamedTempFile};
use vocab_bridge::{files_handling, Config, Corpus, Dictionary, Error, KeyedVectors, Pipeline, SentenceStream, Tokenizer};

const PETS: [&str; 5] = ["cat", "dog", "puppy", "kitten", "leash"];
const CARS: [&str; 5] = ["engine", "wheel", "brake", "garage", "fuel"];

fn corpus_file() -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    for i in 0..60 {
        let topic = if i % 2 == 0 { &PETS } else { &CARS };
        let words: Vec<&str> = (0..6).map(|j| topic[(i + j * 3) % topic.len()]).collect();
        // a rare token, seen in one document only
        if i == 7 {
            writeln!(f, "{} unicorn", words.join(" ")).unwrap();
        } else {
            writeln!(f, "The {}.", words.join(", ")).unwrap();
        }
    }
    f
}

#[test]
fn vocabulary_is_shared_between_models() {
    let f = corpus_file();
    let out = tempdir().unwrap();
    let out_dir = out.path().display().to_string();
    let json = json!({
        "corpus_file": f.path().display().to_string(),
        "output_dir": out_dir,
        "num_topics": 2,
        "vector_size": 16,
        "min_count": 1,
        "epochs": 3,
        "workers": 2,
        "batch_words": 50
    });
    let params = Config::from_json(&json).unwrap().get_params();
    let output = Pipeline::run(&params).unwrap();

    assert!(output.dictionary.id_of("unicorn").is_none());
    assert_eq!(output.dictionary.len(), PETS.len() + CARS.len());
    assert_eq!(output.dictionary.num_docs(), 60);

    let dictionary_tokens: HashSet<&String> = output.dictionary.tokens().iter().collect();
    let word2vec_tokens: HashSet<&String> = output.word2vec.words().iter().collect();
    assert!(word2vec_tokens.is_subset(&dictionary_tokens));
    assert_eq!(word2vec_tokens, dictionary_tokens);
    for token in output.dictionary.tokens() {
        let id = output.dictionary.id_of(token).unwrap();
        assert_eq!(output.word2vec.word_count(token), output.dictionary.doc_freq(id));
    }

    assert_eq!(output.lsi.num_topics(), 2);
    let s = output.lsi.singular_values();
    assert!(s[0] >= s[1] && s[1] >= 0.0);

    let vecs: Array2<f32> = files_handling::read_input(&format!("{}/vecs", out_dir)).unwrap();
    let words: Vec<String> = files_handling::read_input(&format!("{}/words", out_dir)).unwrap();
    assert_eq!(vecs.dim(), (10, 16));
    assert!(vecs.iter().all(|v| v.is_finite()));
    let wv = KeyedVectors::from_saved(words, vecs).unwrap();
    assert!(wv.contains("kitten"));

    let dictionary = Dictionary::load(&format!("{}/dictionary", out_dir)).unwrap();
    assert_eq!(dictionary, output.dictionary);
}

#[test]
fn sentence_stream_is_repeatable() {
    let f = corpus_file();
    let sentences = SentenceStream::new(f.path(), Tokenizer::english());
    let first: Vec<Vec<String>> = sentences.stream().unwrap().map(Result::unwrap).collect();
    let second: Vec<Vec<String>> = sentences.stream().unwrap().map(Result::unwrap).collect();
    assert_eq!(first.len(), 60);
    assert_eq!(first, second);
    assert!(first.iter().flatten().all(|token| token != "the"));
}

#[test]
fn corpus_without_tokens_is_an_error() {
    let mut f = NamedTempFile::new().unwrap();
    writeln!(f, "   ").unwrap();
    writeln!(f, "the a 12").unwrap();
    let json = json!({"corpus_file": f.path().display().to_string()});
    let params = Config::from_json(&json).unwrap().get_params();
    assert!(matches!(Pipeline::run(&params), Err(Error::EmptyVocabulary(_))));
}

#[test]
fn missing_corpus_is_an_error() {
    let dir = tempdir().unwrap();
    let json = json!({"corpus_file": dir.path().join("missing.txt").display().to_string()});
    let params = Config::from_json(&json).unwrap().get_params();
    assert!(Pipeline::run(&params).is_err());
}

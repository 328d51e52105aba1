
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use serde_json::Value;
use crate::dictionary::DEFAULT_NO_BELOW;
use crate::errors::{Error, Result};
use crate::lsi::LsiParams;
use crate::word2vec::{Algorithm, Word2VecParams};

#[derive(Clone, Debug)]
pub struct Params {
    pub corpus_file: String,
    pub output_dir: Option<String>,
    pub no_below: usize,
    pub no_above: Option<f64>,
    pub keep_n: Option<usize>,
    pub num_topics: usize,
    pub lsi: LsiParams,
    pub word2vec: Word2VecParams,
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using hyper-params:
        corpus_file: {}
        output_dir: {:?}
        no_below: {}
        no_above: {:?}
        keep_n: {:?}
        num_topics: {}
        power_iters: {}
        extra_samples: {},
        Using {}",
        self.corpus_file, self.output_dir, self.no_below, self.no_above, self.keep_n,
        self.num_topics, self.lsi.power_iters, self.lsi.extra_samples, self.word2vec)
    }
}

pub struct Config {
    params: Params
}

impl Config {

    pub fn get_params(&self) -> Params {
        self.params.clone()
    }

    /// `args` as collected from the command line, the program name followed
    /// by the path to a json file of parameters.
    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(Error::Config("input should be a path to json file only".to_string()));
        }

        let f = BufReader::new(File::open(&args[1])?);
        let json: Value = serde_json::from_reader(f)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &Value) -> Result<Config> {

        if !json.is_object() {
            return Err(Error::Config("parameters should be a json object".to_string()));
        }

        let corpus_file = match json.get("corpus_file") {
            Some(corpus_file) => corpus_file
                .as_str()
                .ok_or_else(|| Error::Config("cannot cast corpus_file to string".to_string()))?,
            None => return Err(Error::Config("corpus_file was not supplied through json".to_string())),
        };
        let output_dir = match json.get("output_dir") {
            Some(output_dir) => Some(
                output_dir
                    .as_str()
                    .ok_or_else(|| Error::Config("cannot cast output_dir to string".to_string()))?
                    .to_owned(),
            ),
            None => None,
        };

        // handle default vs input parameters
        let defaults = Word2VecParams::default();
        let sg = match json.get("sg") {
            Some(sg) => match sg.as_u64() {
                Some(0) => Algorithm::Cbow,
                Some(1) => Algorithm::SkipGram,
                _ => return Err(Error::Config("sg should be 0 (cbow) or 1 (skip-gram)".to_string())),
            },
            None => defaults.sg,
        };
        let word2vec = Word2VecParams {
            vector_size: get_usize(json, "vector_size", defaults.vector_size)?,
            alpha: get_f64(json, "alpha", defaults.alpha as f64)? as f32,
            min_alpha: get_f64(json, "min_alpha", defaults.min_alpha as f64)? as f32,
            window: get_usize(json, "window", defaults.window)?,
            min_count: get_usize(json, "min_count", defaults.min_count)?,
            sample: get_f64(json, "sample", defaults.sample)?,
            sg,
            negative: get_usize(json, "negative", defaults.negative)?,
            epochs: get_usize(json, "epochs", defaults.epochs)?,
            workers: get_usize(json, "workers", defaults.workers)?,
            seed: get_usize(json, "seed", defaults.seed as usize)? as u64,
            batch_words: get_usize(json, "batch_words", defaults.batch_words)?,
        };
        word2vec.validate()?;

        let lsi_defaults = LsiParams::default();
        let lsi = LsiParams {
            power_iters: get_usize(json, "power_iters", lsi_defaults.power_iters)?,
            extra_samples: get_usize(json, "extra_samples", lsi_defaults.extra_samples)?,
            seed: word2vec.seed,
        };

        let no_above = match json.get("no_above") {
            Some(_) => Some(get_f64(json, "no_above", 1.0)?),
            None => None,
        };
        let keep_n = match json.get("keep_n") {
            Some(_) => Some(get_usize(json, "keep_n", 0)?),
            None => None,
        };

        let params = Params {
            corpus_file: corpus_file.to_owned(),
            output_dir,
            no_below: get_usize(json, "no_below", DEFAULT_NO_BELOW)?,
            no_above,
            keep_n,
            num_topics: get_usize(json, "num_topics", 200)?,
            lsi,
            word2vec,
        };

        Ok(Self { params })
    }
}

fn get_usize(json: &Value, key: &str, default: usize) -> Result<usize> {
    match json.get(key) {
        Some(value) => value
            .as_u64()
            .map(|value| value as usize)
            .ok_or_else(|| Error::Config(format!("given {} is not a non-negative integer", key))),
        None => Ok(default),
    }
}

fn get_f64(json: &Value, key: &str, default: f64) -> Result<f64> {
    match json.get(key) {
        Some(value) => value
            .as_f64()
            .ok_or_else(|| Error::Config(format!("given {} is not numeric", key))),
        None => Ok(default),
    }
}

use std::env;
use std::process;
use log::{error, info};
use vocab_bridge::{Config, Pipeline};

// usage: vocab_bridge <params.json>
// the json holds corpus_file (one document per line) and optionally
// output_dir and the hyper parameters of every stage

fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("entering program...");
    let args: Vec<String> = env::args().collect();

    info!("building parameters...");
    let params = match Config::new(&args) {
        Ok(config) => config.get_params(),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    match Pipeline::run(&params) {
        Ok(output) => info!(
            "done, {} tokens in the dictionary, {} lsi topics, {} word vectors",
            output.dictionary.len(), output.lsi.num_topics(), output.word2vec.vocab_len()
        ),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}

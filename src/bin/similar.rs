use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::process;
use log::{error, warn};
use ndarray::Array2;
use vocab_bridge::{files_handling, Error, KeyedVectors, Result};

// checks on trained vectors: the K most similar words to a given word, or to
// a combination of words (analogies).
// arguments:
// a letter selector: "a" for analogies, "b" for word similarity
// path to queries, quartets for "a" and one token per line for "b"
// path to trained vecs (npy) and to tokens (json), both without extension
// example: ... a queries/analogies.txt output/vecs output/words

const K: usize = 10;

fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {

    if args.len() != 5 {
        return Err(Error::Config("expected arguments: <a|b> <queries> <vecs> <words>".to_string()));
    }
    let selector = args[1].as_str();
    if !["a", "b"].contains(&selector) {
        return Err(Error::Config(format!("unrecognized pattern in first argument {}", selector)));
    }

    let lines = BufReader::new(File::open(&args[2])?)
        .lines()
        .collect::<std::io::Result<Vec<String>>>()?;

    let vectors: Array2<f32> = files_handling::read_input(&args[3])?;
    let words: Vec<String> = files_handling::read_input(&args[4])?;
    let wv = KeyedVectors::from_saved(words, vectors)?;

    if selector == "a" {
        let inputs: Vec<Vec<&str>> = lines
            .iter()
            .map(|line| line.split_whitespace().collect())
            .filter(|quartet: &Vec<&str>| !quartet.is_empty())
            .collect();
        run_analogies(&inputs, K, &wv)
    } else {
        let inputs: Vec<&str> = lines.iter().map(|line| line.trim()).filter(|line| !line.is_empty()).collect();
        run_similarity(&inputs, K, &wv)
    }
}

fn run_analogies(inputs: &[Vec<&str>], k: usize, wv: &KeyedVectors) -> Result<()> {

    // a is to b as c is to ?, which translates to b - a + c
    // i.e : high is to higher as good is to : better

    for input in inputs {

        if input.len() != 4 {
            warn!("skipping '{}', expected 4 tokens", input.join(" "));
            continue;
        }

        let source = [input[0], input[1], input[2]];
        let target = input[3];

        let analogies = match wv.analogy(source, k) {
            Ok(analogies) => analogies,
            Err(Error::KeyNotFound(token)) => {
                warn!("skipping '{}', token: {} is not in the vocabulary", input.join(" "), token);
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut found_target = false;
        for (i, (analogy, score)) in analogies.iter().enumerate() {
            println!("{} : {} - {} + {} ? {} = {}", i, source[1], source[0], source[2], analogy, score);
            if analogy == target {
                found_target = true;
                println!("found target '{}' analogy in place {}", target, 1 + i);
            }
        }

        if !found_target {
            println!("target '{}' was not found within the first {} analogies", target, k);
        }
        println!();
    }
    Ok(())
}

fn run_similarity(inputs: &[&str], k: usize, wv: &KeyedVectors) -> Result<()> {

    for token in inputs {

        println!("searching {} most similar words to {}", k, token);
        let similarities = match wv.most_similar(token, k) {
            Ok(similarities) => similarities,
            Err(Error::KeyNotFound(_)) => {
                warn!("token: {} is not in the vocabulary", token);
                continue;
            }
            Err(e) => return Err(e),
        };
        for (i, (similar_token, score)) in similarities.iter().enumerate() {
            println!("{} : {} ? {} = {}", i, token, similar_token, score);
        }
        println!();
    }
    Ok(())
}

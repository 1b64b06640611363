use clap::Parser;
use log::info;

use wordchain_core::io::{read_file, normalize_folder};
use wordchain_core::{Chain, ChainError, ChainOptions, DeadEndPolicy};

/// Generate sentences from plain-text corpora.
#[derive(Parser, Debug)]
#[command(name = "wordchain", about = "Word-level Markov chain sentence generator")]
struct Args {
    /// Directory of `.txt` corpora, used when no --file is given
    #[arg(long, default_value = "./data")]
    data: String,

    /// Corpus file to ingest (repeatable)
    #[arg(long = "file")]
    files: Vec<String>,

    /// Number of sentences to print
    #[arg(long, default_value_t = 10)]
    count: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Return the partial sentence at a dead end instead of failing
    #[arg(long)]
    salvage: bool,

    /// Maximum tokens per sentence (0 disables the cap)
    #[arg(long, default_value_t = wordchain_core::model::options::DEFAULT_MAX_TOKENS)]
    max_tokens: usize,

    /// Ingest files with one worker thread per chunk of lines
    #[arg(long)]
    parallel: bool,

    /// Print the successor table before generating
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // 'Strict' fails when a word has no successor (e.g. the last word of an
    // unpunctuated corpus), 'Salvage' ends the sentence on that word instead
    let options = ChainOptions {
        dead_end: if args.salvage { DeadEndPolicy::Salvage } else { DeadEndPolicy::Strict },
        max_tokens: args.max_tokens,
    };
    let mut chain = Chain::with_options(options, args.seed);

    // Ingest the given files in order, or every .txt file of the data directory
    if args.files.is_empty() {
        let names = chain.add_from_dir(normalize_folder(&args.data), "txt")?;
        info!("loaded corpora {:?}", names);
    } else if args.parallel {
        for file in &args.files {
            let lines = read_file(file).map_err(|e| ChainError::SourceUnavailable { path: Some(file.into()), source: e })?;
            chain.add_lines_parallel(&lines);
        }
    } else {
        for file in &args.files {
            chain.add_from_file(file)?;
        }
    }
    info!("{} tokens, {} predecessors", chain.word_count(), chain.predecessor_count());

    if args.dump {
        print!("{}", chain.debug_dump());
    }

    // A dead end is probabilistic: report it and keep drawing
    for i in 0..args.count {
        match chain.generate_sentence() {
            Ok(sentence) => println!("Generated sentence {}: {}", i + 1, sentence),
            Err(e @ ChainError::DeadEnd { .. }) => println!("Generated sentence {}: <{}>", i + 1, e),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

//! LexiKV CLI
//!
//! Command-line access to a dictionary stored on local disk.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lexikv::{Config, DictionaryCache, LifecycleManager, MaintenanceOutcome, Segmenter};
use tracing_subscriber::{fmt, EnvFilter};

/// LexiKV CLI
#[derive(Parser, Debug)]
#[command(name = "lexikv")]
#[command(about = "Trie-indexed dictionary on an embedded key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./lexikv_data")]
    data_dir: PathBuf,

    /// Base tokenizer dictionary (`word frequency pos` per line)
    #[arg(long)]
    dict: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add or replace a word
    Add {
        word: String,

        #[arg(short, long, default_value = "1000")]
        frequency: f64,

        #[arg(short, long, default_value = "nz")]
        pos: String,
    },

    /// Learn the unknown words of a text
    Learn {
        text: String,
    },

    /// Segment a text with the current vocabulary
    Segment {
        text: String,
    },

    /// Check whether a word is in the dictionary
    Contains {
        word: String,
    },

    /// List stored words
    Keys {
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Run one maintenance pass now
    Gc {
        #[arg(short, long, default_value = "0.5")]
        ratio: f64,
    },

    /// Write every record to a backup file
    Backup {
        file: PathBuf,
    },

    /// Load a backup file
    Restore {
        file: PathBuf,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lexikv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> lexikv::Result<()> {
    let config = Config::builder().data_dir(&args.data_dir).try_build()?;

    let segmenter = match &args.dict {
        Some(path) => Segmenter::from_dictionary(&fs::read_to_string(path)?)?,
        None => Segmenter::new(),
    };

    let store = LifecycleManager::open(config.clone())?;
    let mut cache = DictionaryCache::open(store, segmenter, &config)?;

    let result = execute(&mut cache, args.command);
    let closed = cache.close();
    result.and(closed)
}

fn execute(cache: &mut DictionaryCache, command: Commands) -> lexikv::Result<()> {
    match command {
        Commands::Add { word, frequency, pos } => {
            cache.add_word(&word, frequency, &pos)?;
            println!("OK");
        }
        Commands::Learn { text } => {
            for word in cache.learn_from_text(&text)? {
                println!("{}", word);
            }
        }
        Commands::Segment { text } => {
            println!("{}", cache.segment(&text).join(" / "));
        }
        Commands::Contains { word } => match cache.entry(&word) {
            Some(entry) => println!("{} {} {}", entry.content, entry.frequency, entry.pos),
            None => println!("(nil)"),
        },
        Commands::Keys { prefix } => {
            let prefix = prefix.as_deref().map(str::as_bytes);
            for key in cache.engine().keys(prefix)? {
                println!("{}", String::from_utf8_lossy(&key));
            }
        }
        Commands::Gc { ratio } => match cache.engine().run_maintenance(ratio)? {
            MaintenanceOutcome::Skipped { reclaimable } => {
                println!("Skipped ({:.1}% reclaimable)", reclaimable * 100.0);
            }
            MaintenanceOutcome::Compacted {
                tables_merged,
                entries_dropped,
                bytes_reclaimed,
            } => {
                println!(
                    "Merged {} tables, dropped {} entries, reclaimed {} bytes",
                    tables_merged, entries_dropped, bytes_reclaimed
                );
            }
        },
        Commands::Backup { file } => {
            let count = cache.engine().backup(&file)?;
            println!("{} records", count);
        }
        Commands::Restore { file } => {
            let count = cache.engine().restore(&file)?;
            println!("{} records", count);
        }
    }
    Ok(())
}

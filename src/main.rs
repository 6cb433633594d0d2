//! # TM Harness CLI (`tm`)
//!
//! The `tm` binary drives the translation-memory engine against a search
//! backend: importing TMX files, looking up matches, indexing single units
//! and maintaining imported origins.
//!
//! ## Usage
//!
//! ```bash
//! tm --config ./config/tm.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tm import <file>...` | Import TMX files into the index |
//! | `tm search "<text>"` | Look up stored translations |
//! | `tm index --id ...` | Index one translation unit |
//! | `tm delete <origin>` | Remove every entry imported from an origin |
//! | `tm origins` | List imported origins |
//! | `tm empty --yes` | Remove every entry |
//! | `tm count` | Count indexed entries |
//!
//! ## Examples
//!
//! ```bash
//! # Import a memory, remapping a non-standard language tag
//! tm import memory.tmx --langmap en_US=en
//!
//! # Look up matches for German
//! tm search "Save the file" --source-lang en --target-lang de
//!
//! # Replace an earlier import
//! tm delete memory.tmx && tm import memory.tmx
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tm_harness::config::{self, Config};
use tm_harness::engine::TranslationMemory;
use tm_harness::error::TmError;
use tm_harness::import::ImportOutcome;
use tm_harness::logging;
use tm_harness::models::{ScoredMatch, TranslationUnit};
use tm_harness::search::LanguageFilter;
use tm_harness::writer::{CancelToken, WriteOutcome};

const DEFAULT_CONFIG: &str = "./config/tm.toml";

/// TM Harness CLI: translation-memory lookup and TMX import over an
/// Elasticsearch-compatible backend.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/tm.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "tm",
    about = "TM Harness: translation-memory lookup and TMX import over a search backend",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/tm.toml`. Built-in defaults are used when the
    /// default file does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Log at DEBUG instead of INFO. `RUST_LOG`, when set, takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import TMX files.
    ///
    /// Every unit with text for the header's source language becomes one
    /// entry per other language. Entries are tagged with the file name as
    /// their origin. The first failing batch aborts the file.
    Import {
        /// TMX files to import.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Language tag remapping as `raw=canonical` pairs (overrides `import.langmap`).
        #[arg(long = "langmap", value_parser = parse_key_val)]
        langmap: Vec<(String, String)>,
    },

    /// Look up stored translations for a text.
    Search {
        /// Source text to match.
        text: String,

        /// Only match entries with this source language.
        #[arg(long, requires = "target_lang")]
        source_lang: Option<String>,

        /// Only match entries with this target language.
        #[arg(long, requires = "source_lang")]
        target_lang: Option<String>,

        /// Print matches as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Index a single translation, overwriting any entry with the same id.
    Index {
        #[arg(long)]
        id: String,
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        source_lang: String,
        #[arg(long)]
        target_lang: String,
        /// Origin tag stored with the entry.
        #[arg(long, default_value = "cli")]
        origin: String,
    },

    /// Delete every entry imported from an origin.
    Delete {
        /// Origin to remove (a TMX file name for imports).
        origin: String,
    },

    /// List the origins present in the index.
    Origins,

    /// Remove every entry from the translation memory.
    ///
    /// The index itself is kept. Requires `--yes`.
    Empty {
        /// Confirm deleting all entries.
        #[arg(long)]
        yes: bool,
    },

    /// Count indexed entries.
    Count,
}

/// Parse a `key=value` pair for `--langmap` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Load `path`, falling back to defaults only for a missing default file.
fn resolve_config(path: &Path) -> anyhow::Result<Config> {
    if path == Path::new(DEFAULT_CONFIG) && !path.exists() {
        return Ok(Config::default());
    }
    config::load_config(path)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = resolve_config(&cli.config)?;
    let memory = TranslationMemory::connect(cfg).context("Failed to create backend client")?;

    match cli.command {
        Commands::Import { files, langmap } => run_import(&memory, &files, langmap)?,
        Commands::Search {
            text,
            source_lang,
            target_lang,
            json,
        } => {
            let filter = match (source_lang, target_lang) {
                (Some(source_language), Some(target_language)) => Some(LanguageFilter {
                    source_language,
                    target_language,
                }),
                _ => None,
            };
            run_search(&memory, &text, filter.as_ref(), json)?;
        }
        Commands::Index {
            id,
            source,
            target,
            source_lang,
            target_lang,
            origin,
        } => {
            let unit = TranslationUnit {
                id,
                source_text: source,
                target_text: target,
                source_language: source_lang,
                target_language: target_lang,
                origin,
            };
            match memory.index_unit(&unit) {
                WriteOutcome::Indexed => println!("indexed {}", unit.id),
                WriteOutcome::Skipped => println!("skipped {} (no source text)", unit.id),
                WriteOutcome::Failed(e) => eprintln!("warning: {} not indexed: {}", unit.id, e),
            }
        }
        Commands::Delete { origin } => {
            let deleted = memory.delete_origin(&origin)?;
            println!("deleted {} entries from {}", deleted, origin);
        }
        Commands::Origins => {
            let origins = memory.origins()?;
            if origins.is_empty() {
                println!("No origins.");
            }
            for origin in origins {
                println!("{}", origin);
            }
        }
        Commands::Empty { yes } => {
            if !yes {
                bail!("refusing to delete every entry without --yes");
            }
            let deleted = memory.empty()?;
            println!("deleted {} entries", deleted);
        }
        Commands::Count => println!("{}", memory.count()?),
    }

    Ok(())
}

fn run_import(
    memory: &TranslationMemory,
    files: &[PathBuf],
    langmap: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let langmap: HashMap<String, String> = langmap.into_iter().collect();
    let langmap = (!langmap.is_empty()).then_some(&langmap);
    let cancel = CancelToken::new();
    let mut failed = 0;

    for path in files {
        let outcome = memory.import_tmx(path, langmap, &cancel);
        let stats = *outcome.stats();
        println!("import {}", path.display());
        println!("  units: {}", stats.units);
        println!("  skipped (no source text): {}", stats.skipped_units);
        println!("  documents: {}", stats.documents);
        println!("  batches committed: {}", stats.batches_committed);
        match outcome {
            ImportOutcome::Completed(_) => println!("ok"),
            ImportOutcome::Aborted { error, .. } => {
                println!("aborted: {}", error);
                failed += 1;
            }
            ImportOutcome::Cancelled(_) => {
                println!("cancelled");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} import(s) did not complete", failed, files.len());
    }
    Ok(())
}

fn run_search(
    memory: &TranslationMemory,
    text: &str,
    filter: Option<&LanguageFilter>,
    json: bool,
) -> anyhow::Result<()> {
    let matches = match memory.lookup(text, filter) {
        Ok(matches) => matches,
        Err(TmError::NoResults) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }
    if matches.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for (i, m) in matches.iter().enumerate() {
        print_match(i + 1, m);
    }
    Ok(())
}

fn print_match(rank: usize, m: &ScoredMatch) {
    println!("{}. [{:.2}%] {}", rank, m.similarity, m.target_text);
    println!("    source: {}", m.source_text);
    println!("    via: {}", m.label);
    println!();
}

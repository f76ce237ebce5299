//! Open Library CLI
//!
//! Command-line lookups and record validation against the catalog service.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use ol_client::{validate_document, Config, Olid, OpenLibrary, RecordKind, ValidateError};

#[derive(Parser)]
#[command(name = "ol-client")]
#[command(about = "Look up and validate Open Library catalog records")]
#[command(version)]
struct Cli {
    /// Base URL of the catalog service (default: the public service, or
    /// OL_BASE_URL from the environment)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a record by OLID and print its wire JSON
    Get {
        /// Record identifier, e.g. OL45883W, OL7353617M, or OL26170A
        olid: Olid,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Look up an edition by ISBN via the bib-key endpoint
    Isbn {
        isbn: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Search for a work and print the best match
    Search {
        /// Work title to search for
        #[arg(long)]
        title: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Resolve an author name to its OLID via autocomplete
    Author {
        /// Author name, e.g. "Benjamin Franklin"
        name: String,
    },

    /// Validate a record document from a file against its embedded schema
    Validate {
        /// JSON file holding one record document; the record kind is
        /// inferred from its key prefix
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Get { olid, pretty } => run_get(&cli.base_url, &olid, pretty),
        Commands::Isbn { isbn, pretty } => run_isbn(&cli.base_url, &isbn, pretty),
        Commands::Search { title, pretty } => run_search(&cli.base_url, &title, pretty),
        Commands::Author { name } => run_author(&cli.base_url, &name),
        Commands::Validate { file } => run_validate(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn client(base_url: &Option<String>) -> Result<OpenLibrary, u8> {
    let mut config = Config::from_env();
    if let Some(base_url) = base_url {
        config = config.with_base_url(base_url.clone());
    }
    OpenLibrary::new(config).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })
}

fn print_json(value: &Value, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", json_output);
    Ok(())
}

fn run_get(base_url: &Option<String>, olid: &Olid, pretty: bool) -> Result<(), u8> {
    let ol = client(base_url)?;
    let record = ol.get(olid).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    print_json(&record.to_json(), pretty)
}

fn run_isbn(base_url: &Option<String>, isbn: &str, pretty: bool) -> Result<(), u8> {
    let ol = client(base_url)?;
    match ol.edition_by_isbn(isbn) {
        Ok(Some(edition)) => print_json(&edition.to_json(), pretty),
        Ok(None) => {
            eprintln!("no edition found for ISBN {}", isbn);
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

fn run_search(base_url: &Option<String>, title: &str, pretty: bool) -> Result<(), u8> {
    let ol = client(base_url)?;
    match ol.search_work(title) {
        Ok(Some(work)) => print_json(&work.to_json(), pretty),
        Ok(None) => {
            eprintln!("no work matched title {:?}", title);
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

fn run_author(base_url: &Option<String>, name: &str) -> Result<(), u8> {
    let ol = client(base_url)?;
    match ol.author_olid_by_name(name) {
        Ok(Some(olid)) => {
            println!("{}", olid);
            Ok(())
        }
        Ok(None) => {
            eprintln!("no author matched {:?}", name);
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

fn run_validate(file: &PathBuf) -> Result<(), u8> {
    let content = std::fs::read_to_string(file).map_err(|e| {
        eprintln!("Error reading {}: {}", file.display(), e);
        3u8
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|e| {
        eprintln!("Error: invalid JSON in {}: {}", file.display(), e);
        2u8
    })?;

    let Some(kind) = infer_kind(&document) else {
        eprintln!(
            "Error: cannot infer record kind: expected a key starting with /books/, /works/, or /authors/"
        );
        return Err(2);
    };

    match validate_document(kind, &document) {
        Ok(()) => {
            println!("Valid");
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            eprintln!("Validation failed:");
            for error in errors {
                eprintln!("  {}", error);
            }
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}

/// Pick the schema from the document's own key prefix.
fn infer_kind(document: &Value) -> Option<RecordKind> {
    let key = document.get("key")?.as_str()?;
    if key.starts_with("/books/") {
        Some(RecordKind::Edition)
    } else if key.starts_with("/works/") {
        Some(RecordKind::Work)
    } else if key.starts_with("/authors/") {
        Some(RecordKind::Author)
    } else {
        None
    }
}

use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mosaic_ls::config::{load_config_file, load_user_config, user_config_path};
use mosaic_ls::document::DocumentStore;
use mosaic_ls::embedding::{CapabilitySet, ExtractedRegion, StaticExtractor};
use mosaic_ls::mapping::MappingSource;
use mosaic_ls::{EditTranslator, LanguageEngine, LanguageService, MosaicSettings, RangeMapper};
use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::{Position, Range, TextEdit};
use url::Url;

/// Coordinate bridge between composite documents and their embedded regions
#[derive(Parser)]
#[command(name = "mosaic-ls")]
#[command(version)]
#[command(about = "Map ranges and edits between composite documents and their embedded regions")]
struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a host position or range into the virtual documents of a fixture
    Map {
        /// Fixture JSON describing the host document and its regions
        #[arg(long)]
        fixture: PathBuf,

        /// Zero-based line of the start position
        #[arg(long)]
        line: u32,

        /// Zero-based UTF-16 column of the start position
        #[arg(long)]
        character: u32,

        /// End line; defaults to the start line
        #[arg(long)]
        end_line: Option<u32>,

        /// End column; defaults to the start column
        #[arg(long)]
        end_character: Option<u32>,
    },
    /// Translate edits made against virtual documents into host edits
    Translate {
        /// Fixture JSON describing the host document and its regions
        #[arg(long)]
        fixture: PathBuf,

        /// JSON object from virtual URI (or region id) to a list of text edits
        #[arg(long)]
        edits: PathBuf,
    },
    /// Load a configuration file and print the effective settings
    CheckConfig {
        /// Configuration file (default: the user configuration)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Also print the effective capabilities of this embedded language
        #[arg(long)]
        language: Option<String>,
    },
}

/// A host document and the regions extracted from it.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    uri: Url,
    language_id: String,
    version: serde_json::Value,
    text: String,
    #[serde(default)]
    regions: Vec<ExtractedRegion>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MappedOutput {
    virtual_uri: Url,
    region_id: String,
    host_range: Range,
    virtual_range: Range,
    capabilities: CapabilitySet,
}

/// The CLI only maps; no engine is attached.
struct NoEngine;

impl LanguageEngine for NoEngine {
    fn has_analyzable_unit(&self, _uri: &Url) -> bool {
        true
    }
}

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::Map {
            fixture,
            line,
            character,
            end_line,
            end_character,
        } => {
            let (service, host_uri) = load_fixture(&fixture)?;
            let start = Position::new(line, character);
            let end = Position::new(end_line.unwrap_or(line), end_character.unwrap_or(character));

            let mapped: Vec<MappedOutput> = RangeMapper::new(&service)
                .to_virtual(&host_uri, Range::new(start, end))
                .into_iter()
                .map(|m| MappedOutput {
                    virtual_uri: m.virtual_uri().clone(),
                    region_id: m.document.region_id().to_string(),
                    host_range: m.host_range,
                    virtual_range: m.virtual_range,
                    capabilities: m.capabilities,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&mapped)?);
        }
        Commands::Translate { fixture, edits } => {
            let (service, host_uri) = load_fixture(&fixture)?;
            let source = std::fs::read_to_string(&edits)?;
            let requested: BTreeMap<String, Vec<TextEdit>> = serde_json::from_str(&source)?;

            let extraction = service
                .extraction(&host_uri)
                .ok_or_else(|| format!("{} has no regions", host_uri))?;
            let mut files = Vec::with_capacity(requested.len());
            for (key, edits) in requested {
                let uri = match Url::parse(&key) {
                    Ok(uri) => uri,
                    Err(_) => extraction
                        .documents()
                        .iter()
                        .find(|doc| doc.region_id() == key)
                        .map(|doc| doc.uri().clone())
                        .ok_or_else(|| format!("unknown region '{}'", key))?,
                };
                files.push((uri, edits));
            }

            let host_edits = EditTranslator::new(&service).translate_batch(files);
            println!("{}", serde_json::to_string_pretty(&host_edits)?);
        }
        Commands::CheckConfig { config, language } => {
            let settings = match config {
                Some(path) => load_config_file(&path)?,
                None => {
                    match user_config_path() {
                        Some(path) => eprintln!("Using {}", path.display()),
                        None => eprintln!("No user config directory; using defaults"),
                    }
                    load_user_config()?.unwrap_or_default()
                }
            };
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if let Some(language) = language {
                let effective = settings.effective_capabilities(&language, CapabilitySet::all());
                println!("{}", serde_json::to_string_pretty(&effective)?);
            }
        }
    }
    Ok(())
}

fn load_fixture(path: &Path) -> CliResult<(LanguageService<NoEngine>, Url)> {
    let source = std::fs::read_to_string(path)?;
    let fixture: Fixture = serde_json::from_str(&source)?;
    let version = match fixture.version {
        serde_json::Value::String(version) => version,
        other => other.to_string(),
    };

    let store = Arc::new(DocumentStore::new());
    store.open(fixture.uri.clone(), fixture.language_id, version, fixture.text);
    let extractor = Arc::new(StaticExtractor::new());
    extractor.set(fixture.uri.clone(), fixture.regions);

    let settings = load_user_config()?.unwrap_or_else(MosaicSettings::default);
    let service = LanguageService::new(store, extractor, NoEngine).with_settings(settings);
    Ok((service, fixture.uri))
}

mod etl;
mod data;
mod errors;
mod streets;

use std::fs::{create_dir_all, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::errors::{Error, ErrorKind, Result};
use crate::etl::audit_streets::AuditStreetsEtl;
use crate::etl::convert::{ConvertEtl, MissingFieldPolicy};
use crate::etl::count_tags::CountTagsEtl;
use crate::etl::shape::DEFAULT_TAG_TYPE;
use crate::etl::tables::OutputEncoding;
use crate::etl::Etl;
use crate::streets::StreetAuditConfig;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserConfig {
    pub data_path: String,
    #[serde(default = "default_dest_path")]
    pub dest_path: String,
    #[serde(default)]
    pub validate: bool,
    #[serde(default)]
    pub on_missing_field: MissingFieldPolicy,
    #[serde(default)]
    pub encoding: OutputEncoding,
    #[serde(default = "default_tag_type")]
    pub default_tag_type: String,
    #[serde(default)]
    pub progress: bool,
    #[serde(default)]
    pub street_audit: StreetAuditConfig,
}

fn default_dest_path() -> String {
    "output".to_string()
}

fn default_tag_type() -> String {
    DEFAULT_TAG_TYPE.to_string()
}

impl UserConfig {
    pub fn for_input(data_path: String, dest_path: String) -> UserConfig {
        UserConfig {
            data_path,
            dest_path,
            validate: false,
            on_missing_field: MissingFieldPolicy::default(),
            encoding: OutputEncoding::default(),
            default_tag_type: default_tag_type(),
            progress: false,
            street_audit: StreetAuditConfig::default(),
        }
    }
}

fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| Error::new(ErrorKind::Config, format!("Could not open config file {}: {}", path.display(), err)))?;
    serde_json::from_reader(file)
        .map_err(|err| Error::new(ErrorKind::Config, format!("Could not parse config {}: {}", path.display(), err)))
}

#[derive(Parser, Debug)]
#[command(name = "osm-tabular", about = "Convert an .osm export into CSV tables")]
struct Cli {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input .osm or .osm.xz file, overrides `data_path`
    #[arg(short, long)]
    input: Option<String>,

    /// Output directory, overrides `dest_path`
    #[arg(short, long)]
    output: Option<String>,

    /// Validate every shaped element against the table schema
    #[arg(long)]
    validate: bool,

    /// Re-run even if the outputs already exist
    #[arg(long)]
    force: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Write nodes, ways and their tags to five CSV files
    Convert,
    /// Report non-standard street names and propose replacements
    AuditStreets,
    /// Count element names in the document
    CountTags,
}

fn resolve_config(cli: &Cli) -> Result<UserConfig> {
    let mut config = match (&cli.config, &cli.input) {
        (Some(path), _) => load_user_config(path)?,
        (None, Some(input)) => UserConfig::for_input(input.clone(), default_dest_path()),
        (None, None) => return Err(Error::new(ErrorKind::Config, "Either --config or --input is required")),
    };
    if let Some(input) = &cli.input {
        config.data_path = input.clone();
    }
    if let Some(output) = &cli.output {
        config.dest_path = output.clone();
    }
    config.validate |= cli.validate;
    Ok(config)
}

fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let output_dir = PathBuf::from(&config.dest_path);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn run_etl<E: Etl>(mut etl: E, dir: &Path, force: bool) -> Result<()> {
    if force {
        etl.clean(dir)?;
    }
    etl.process(dir)
}

fn run(cli: &Cli) -> Result<()> {
    let user_config = resolve_config(cli)?;
    let output_dir = create_output_dir(&user_config)?;

    match cli.command {
        Command::Convert => run_etl(ConvertEtl::new(&user_config)?, &output_dir, cli.force),
        Command::AuditStreets => run_etl(AuditStreetsEtl::new(&user_config)?, &output_dir, cli.force),
        Command::CountTags => run_etl(CountTagsEtl::new(&user_config), &output_dir, cli.force),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(err = err.message.as_str(); "Run failed");
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

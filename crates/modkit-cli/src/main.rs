use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use modkit_cli::config::{ConfigLoadError, EXAMPLE_CONFIG, ModkitConfig};
use modkit_cli::demo::run_demo;
use modkit_cli::schema_file::SchemaFile;
use modkit_config::{parse_value, persist::read_entries, ConfigRegistry, Settings};
use modkit_logger::init_logging;
use tracing::info;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enables debug mode
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write an example config file
    Init,

    /// Show the contents of a settings file
    Inspect {
        /// Settings file to read
        file: PathBuf,

        /// Schema to validate the file against
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Configuration name (defaults to the schema's name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Change settings and save them
    Set {
        /// Schema declaring the options
        #[arg(short, long)]
        schema: PathBuf,

        /// Configuration name (defaults to the schema's name)
        #[arg(short, long)]
        name: Option<String>,

        /// Settings file (defaults to <settings_dir>/<name>.ini)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// KEY=VALUE pairs
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Run a host and a remote in-process and sync settings between them
    Demo {
        /// Give up after this many ticks
        #[arg(short, long, default_value_t = 10)]
        ticks: u32,
    },
}

fn create_example_config(path: &Path) -> Result<()> {
    if path.exists() {
        eprintln!("Config file already exists at: {}", path.display());
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, EXAMPLE_CONFIG)?;
    info!("Created example config at {}", path.display());
    eprintln!("Config file created at: {}", path.display());
    Ok(())
}

fn load_config(path: &Path) -> Result<ModkitConfig> {
    match ModkitConfig::load_from(path) {
        Ok(config) => Ok(config),
        Err(ConfigLoadError::NotFound) => Ok(ModkitConfig::default()),
        Err(err) => Err(err.into()),
    }
}

fn config_name(name: Option<String>, schema: &SchemaFile) -> Result<String> {
    name.or_else(|| schema.name.clone())
        .context("No configuration name: pass --name or set `name` in the schema")
}

fn print_settings(settings: &Settings) -> Result<()> {
    print!("{}", toml::to_string_pretty(settings)?);
    Ok(())
}

fn inspect(
    file: &Path,
    schema: Option<&Path>,
    name: Option<String>,
    config: &ModkitConfig,
) -> Result<()> {
    let Some(schema_path) = schema else {
        let entries = read_entries(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        for entry in entries {
            println!("{:>4}  {} = {}", entry.line, entry.key, entry.value);
        }
        return Ok(());
    };

    let schema = SchemaFile::load(schema_path)?;
    let name = config_name(name, &schema)?;

    let mut registry = ConfigRegistry::new(config.role);
    let configuration = registry.create(&name, None);
    schema.declare_all(configuration);
    if !configuration.load(file) {
        bail!("Could not load {}", file.display());
    }

    let loaded: Vec<_> = configuration
        .keys()
        .filter(|key| configuration.schema(key).is_some_and(|s| s.was_loaded()))
        .collect();
    print_settings(configuration.settings())?;
    println!("\n# from file: {}", loaded.join(", "));
    Ok(())
}

fn set(
    schema: &Path,
    name: Option<String>,
    file: Option<PathBuf>,
    values: &[String],
    config: &ModkitConfig,
) -> Result<()> {
    let schema = SchemaFile::load(schema)?;
    let name = config_name(name, &schema)?;
    let file = file.unwrap_or_else(|| config.settings_file(&name));

    let mut registry = ConfigRegistry::new(config.role);
    let configuration = registry.create(&name, None);
    schema.declare_all(configuration);
    configuration.load(&file);

    for pair in values {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Expected KEY=VALUE, got '{}'", pair);
        };
        let (key, raw) = (key.trim(), raw.trim());
        let Some(kind) = configuration.schema(key).map(|s| s.kind()) else {
            bail!("'{}' is not declared in the schema", key);
        };
        configuration.set(key, parse_value(kind, raw));
    }

    if !configuration.save(&file) {
        bail!(
            "Settings were not saved to {} (role: {})",
            file.display(),
            configuration.role()
        );
    }
    print_settings(configuration.settings())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(ModkitConfig::config_path);
    let config = load_config(&config_path)?;

    let filter = match cli.debug {
        0 => config.logging.filter.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let _guard = init_logging("cli", config.logging.file, &filter)?;

    match cli.command {
        Command::Init => create_example_config(&config_path),
        Command::Inspect { file, schema, name } => inspect(&file, schema.as_deref(), name, &config),
        Command::Set {
            schema,
            name,
            file,
            values,
        } => set(&schema, name, file, &values, &config),
        Command::Demo { ticks } => {
            let interval = Duration::from_millis(config.tick_interval_ms.max(1));
            let report = run_demo(ticks, interval).await?;

            println!("# remote before sync");
            print_settings(&report.before)?;
            println!(
                "\n# remote after sync ({:?} after {} tick(s))",
                report.final_state, report.ticks
            );
            print_settings(&report.synced)?;
            println!("\n# remote after removing the temporary override");
            print_settings(&report.restored)
        }
    }
}

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use stachetree::config::read_json;
use stachetree::stache::decode::decode_templates;
use stachetree::stache::graph::build_order;
use stachetree::{
    compile_layout, load_options, RenderConfig, RenderOptions, Result, StacheError, Value,
};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "stache-cli", about = "Compile and render tag-tree templates", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the root template to static markup
    Render {
        /// JSON file holding an array of raw templates
        templates: PathBuf,
        /// JSON file holding the root scope
        #[arg(long)]
        state: Option<PathBuf>,
        /// JSON file holding render options
        #[arg(long)]
        options: Option<PathBuf>,
        /// Reject scalar section values
        #[arg(long)]
        strict: bool,
    },
    /// Print the template compile order
    Order {
        templates: PathBuf,
        #[arg(long)]
        options: Option<PathBuf>,
    },
    /// Print decoded node trees
    Decode { templates: PathBuf },
    /// Print the JSON schema of the options file
    Schema,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command, cli.json) {
        if cli.json {
            let json = serde_json::json!({ "error": e });
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

fn run(command: Commands, raw_json: bool) -> Result<()> {
    match command {
        Commands::Render {
            templates,
            state,
            options,
            strict,
        } => {
            let raw = read_templates(&templates)?;
            let mut options = read_options(options.as_deref())?;
            if strict {
                options.strict_sections = Some(true);
            }
            let config = RenderConfig::default().with_options(&options);
            let layout = compile_layout(&raw, &config)?;
            let scope = match state {
                Some(path) => Value::from(read_json::<JsonValue>(&path)?),
                None => Value::Struct(indexmap::IndexMap::new()),
            };
            debug!(root = layout.root().name(), "rendering");
            let markup = layout.render_markup(&scope)?;
            if raw_json {
                print_json(&serde_json::json!({ "root": layout.root().name(), "markup": markup }));
            } else {
                println!("{markup}");
            }
        }
        Commands::Order { templates, options } => {
            let raw = read_templates(&templates)?;
            let config = RenderConfig::default().with_options(&read_options(options.as_deref())?);
            let decoded = decode_templates(&raw)?;
            let order: Vec<&str> = build_order(&decoded, &config.externs)?
                .into_iter()
                .map(|t| t.name.as_str())
                .collect();
            if raw_json {
                print_json(&serde_json::json!(order));
            } else {
                for name in order {
                    println!("{name}");
                }
            }
        }
        Commands::Decode { templates } => {
            let decoded = decode_templates(&read_templates(&templates)?)?;
            print_json(&serde_json::to_value(&decoded)?);
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(RenderOptions);
            print_json(&serde_json::to_value(&schema)?);
        }
    }
    Ok(())
}

// ── Input loading ────────────────────────────────────────────────

fn read_templates(path: &Path) -> Result<Vec<JsonValue>> {
    match read_json::<JsonValue>(path)? {
        JsonValue::Array(items) => Ok(items),
        other => Err(StacheError::decode(format!(
            "{}: expected an array of templates, got {other}",
            path.display()
        ))),
    }
}

fn read_options(path: Option<&Path>) -> Result<RenderOptions> {
    path.map_or_else(|| Ok(RenderOptions::default()), load_options)
}

fn print_json(value: &JsonValue) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

//! GrafPAD CLI
//!
//! Usage:
//!   grafpad [OPTIONS] <COMMAND>
//!
//! Commands:
//!   init        Create the template store and a default config file
//!   templates   List available templates
//!   dashboard   Fetch a dashboard's JSON by UID
//!   panel       Add a panel from a template to a dashboard
//!   flow        Add nodes from a template to a Node-RED flow
//!   target      Add a Prometheus scrape target
//!   config      Show the effective configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use grafpad::client::grafana::dashboard_from_response;
use grafpad::client::prometheus::add_scrape_target_to_file;
use grafpad::client::{GrafanaClient, NodeRedClient, PrometheusClient};
use grafpad::config::{DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
use grafpad::store::{ensure_gitignore, write_if_missing};
use grafpad::{Config, MapResolver, MergeError, Merger, PromptResolver, Store, ValueResolver};

#[derive(Parser)]
#[command(name = "grafpad")]
#[command(about = "Grafana panel and dashboard editing tool, with Prometheus and Node-RED support")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the template store and a default config file
    Init,

    /// List available templates
    Templates,

    /// Fetch a dashboard's JSON by UID and keep a scratch copy
    Dashboard {
        /// Dashboard UID
        uid: String,
    },

    /// Add a panel from a template to a dashboard
    Panel {
        /// Dashboard UID
        uid: String,

        #[command(flatten)]
        fill: FillArgs,
    },

    /// Add nodes from a template to a Node-RED flow
    Flow {
        /// Flow id
        flow_id: String,

        #[command(flatten)]
        fill: FillArgs,
    },

    /// Add a Prometheus scrape target and reload Prometheus
    Target {
        /// Scrape job name
        job: String,

        /// Target address, host:port
        address: String,

        /// Only edit the config file
        #[arg(long)]
        no_reload: bool,
    },

    /// Show the effective configuration, secrets masked
    Config,
}

#[derive(clap::Args)]
struct FillArgs {
    /// Template name (file name without extension)
    #[arg(short, long)]
    template: String,

    /// Placeholder value, NAME=VALUE; anything not given is prompted for
    #[arg(short, long = "set", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Merge and write the scratch copy, but do not upload
    #[arg(long)]
    dry_run: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("missing name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading config '{}'", cli.config.display()))?;
    let store = Store::new(config.store.root.clone());

    match cli.command {
        Command::Init => init(&cli.config, &store),
        Command::Templates => list_templates(&store),
        Command::Dashboard { uid } => show_dashboard(&config, &store, &uid).await,
        Command::Panel { uid, fill } => add_panel(&config, &store, &uid, &fill).await,
        Command::Flow { flow_id, fill } => add_flow_nodes(&config, &store, &flow_id, &fill).await,
        Command::Target {
            job,
            address,
            no_reload,
        } => add_target(&config, &job, &address, no_reload).await,
        Command::Config => {
            println!("{}", config.describe());
            Ok(())
        }
    }
}

fn init(config_path: &Path, store: &Store) -> Result<()> {
    for dir in store.init()? {
        println!("created {}", dir.display());
    }
    if write_if_missing(config_path, DEFAULT_CONFIG_TOML)? {
        println!("created {}", config_path.display());
    }
    let project_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if ensure_gitignore(project_dir)? {
        println!("updated {}", project_dir.join(".gitignore").display());
    }
    println!("Set grafana.api_key in {} to finish setup", config_path.display());
    Ok(())
}

fn list_templates(store: &Store) -> Result<()> {
    let templates = store.list_templates()?;
    if templates.is_empty() {
        println!("No templates in {}", store.templates_dir().display());
    }
    for entry in templates {
        println!(" - {}", entry.name);
    }
    Ok(())
}

async fn show_dashboard(config: &Config, store: &Store, uid: &str) -> Result<()> {
    let grafana = GrafanaClient::new(&config.grafana, config.http.timeout_secs)?;
    let response = grafana.get_dashboard(uid).await?;
    let dashboard = dashboard_from_response(&response)?;

    let path = store.write_scratch(uid, dashboard)?;
    debug!(path = %path.display(), "saved dashboard");
    println!("{}", serde_json::to_string_pretty(dashboard)?);
    Ok(())
}

async fn add_panel(config: &Config, store: &Store, uid: &str, args: &FillArgs) -> Result<()> {
    let template = store.load_template(&args.template)?;
    let grafana = GrafanaClient::new(&config.grafana, config.http.timeout_secs)?;
    let response = grafana.get_dashboard(uid).await?;
    let dashboard = dashboard_from_response(&response)?;

    let mut resolver = resolver(&args.set);
    let mut merger = Merger::new().with_layout(config.layout.clone());
    let merged = merger
        .merge_panel(dashboard, &template, resolver.as_mut())
        .map_err(|e| template_error(e, &template, &args.template))?;

    let path = store.write_scratch(uid, &merged.document)?;
    if args.dry_run {
        println!("Dry run: merged dashboard written to {}", path.display());
        return Ok(());
    }

    grafana.save_dashboard(&merged.document).await?;
    println!("Added panel {} to dashboard {uid}", merged.panel_id);
    Ok(())
}

async fn add_flow_nodes(
    config: &Config,
    store: &Store,
    flow_id: &str,
    args: &FillArgs,
) -> Result<()> {
    let template = store.load_template(&args.template)?;
    let node_red = NodeRedClient::new(&config.node_red, config.http.timeout_secs)?;
    let flow = node_red.get_flow(flow_id).await?;

    let mut resolver = resolver(&args.set);
    let mut merger = Merger::new().with_layout(config.layout.clone());
    let merged = merger
        .merge_flow(&flow, &template, resolver.as_mut())
        .map_err(|e| template_error(e, &template, &args.template))?;

    let path = store.write_scratch(flow_id, &merged.document)?;
    if args.dry_run {
        println!("Dry run: merged flow written to {}", path.display());
        return Ok(());
    }

    node_red.update_flow(flow_id, &merged.document).await?;
    println!(
        "Added {} node(s) to flow {flow_id}",
        merged.inserted_ids().len()
    );
    Ok(())
}

async fn add_target(config: &Config, job: &str, address: &str, no_reload: bool) -> Result<()> {
    let path = &config.prometheus.config_path;
    let changed = add_scrape_target_to_file(path, job, address)
        .with_context(|| format!("updating '{}'", path.display()))?;
    if !changed {
        println!("{address} is already a target of job {job}");
        return Ok(());
    }
    println!("Added {address} to job {job}");

    if no_reload {
        return Ok(());
    }
    let prometheus = PrometheusClient::new(&config.prometheus, config.http.timeout_secs)?;
    prometheus.reload().await?;
    println!("Prometheus reloaded");
    Ok(())
}

/// Preset values from `--set`, prompting on the terminal for the rest
///
/// Prompts block the runtime thread. Merging is the only task running while
/// they wait, and no request is in flight at that point.
fn resolver(presets: &[(String, String)]) -> Box<dyn ValueResolver> {
    let resolver = presets
        .iter()
        .fold(MapResolver::new(), |r, (name, value)| r.with_raw(name.as_str(), value))
        .with_fallback(Box::new(PromptResolver::terminal()));
    Box::new(resolver)
}

/// Attach template source context to malformed-template errors
fn template_error(err: MergeError, template: &str, name: &str) -> anyhow::Error {
    if let Some(report) = template_report(&err, template, name) {
        eprintln!("{report}");
    }
    if matches!(err, MergeError::EmptyTargetCollection { .. }) {
        return anyhow::Error::new(err)
            .context("the target has nothing to place the new element next to; add one by hand first");
    }
    anyhow::Error::new(err)
}

/// Diagnostic for a template syntax error, rendered against the filled text
fn template_report(err: &MergeError, template: &str, name: &str) -> Option<String> {
    if !matches!(err, MergeError::MalformedTemplate { .. }) {
        return None;
    }
    let source = err.filled_text().unwrap_or(template);
    let report = err.format(source, name);
    (report != err.to_string()).then_some(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("TITLE=Boiler room"),
            Ok(("TITLE".to_string(), "Boiler room".to_string()))
        );
        assert_eq!(
            parse_assignment("EXPR=a=b"),
            Ok(("EXPR".to_string(), "a=b".to_string()))
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn test_template_report_uses_filled_text() {
        let template = "{\"title\": \"{{T}}\" \"x\": 1}";
        let dashboard = serde_json::json!({
            "panels": [{"id": 1, "gridPos": {"x": 0, "y": 0, "w": 6, "h": 4}}]
        });
        let mut values = MapResolver::new().with_text("T", "Boiler room");
        let err = Merger::new()
            .merge_panel(&dashboard, template, &mut values)
            .unwrap_err();

        let report = template_report(&err, template, "gauge.json").unwrap();
        assert!(report.contains("Boiler room"));
        assert!(template_report(&MergeError::empty("panels"), template, "gauge.json").is_none());
    }

    #[test]
    fn test_cli_parses_panel_command() {
        let cli = Cli::try_parse_from([
            "grafpad", "panel", "ctM1hTWRz", "-t", "gauge", "--set", "TITLE=CPU", "--dry-run",
        ])
        .unwrap();
        match cli.command {
            Command::Panel { uid, fill } => {
                assert_eq!(uid, "ctM1hTWRz");
                assert_eq!(fill.template, "gauge");
                assert_eq!(fill.set, vec![("TITLE".to_string(), "CPU".to_string())]);
                assert!(fill.dry_run);
            }
            _ => panic!("expected panel command"),
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pathexpr::config::{load_from_path, Config};
use pathexpr::edit::write_all;
use pathexpr::tree::{Addressed, FileArtifact, GraphNode, NodeRef, TextTreeNode, TreeNode};
use pathexpr::{logging, Engine, Project};
use similar::TextDiff;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = "pathexpr.toml";

#[derive(Parser)]
#[command(name = "pathexpr")]
#[command(about = "Query and edit project trees with path expressions", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every node matched by an expression
    Query {
        /// Path expression, e.g. `//File()[@extension='yml']`
        expression: String,

        /// Project root directory
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Config file (defaults to pathexpr.toml under the root, if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Emit matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set the value of every node matched by an expression
    Update {
        expression: String,

        /// New text for each matched node
        value: String,

        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show unified diff of changed files
        #[arg(short, long)]
        diff: bool,

        /// Write changes to disk (dry run otherwise)
        #[arg(short, long)]
        write: bool,
    },

    /// List the type names expressions may use
    Types {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Query {
            expression,
            root,
            config,
            json,
        } => cmd_query(&expression, &root, config, json),
        Commands::Update {
            expression,
            value,
            root,
            config,
            diff,
            write,
        } => cmd_update(&expression, &value, &root, config, diff, write),
        Commands::Types { config } => cmd_types(config),
    }
}

/// Explicit config path, else `pathexpr.toml` under `root` when it exists,
/// else defaults.
fn load_config(explicit: Option<PathBuf>, root: &Path) -> Result<Config> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let candidate = root.join(DEFAULT_CONFIG);
            if !candidate.exists() {
                debug!("no config file, using defaults");
                return Ok(Config::default());
            }
            candidate
        }
    };
    info!(path = %path.display(), "loading config");
    Ok(load_from_path(&path)?)
}

fn open(root: &Path, config: Option<PathBuf>) -> Result<(Config, Engine, Project)> {
    let config = load_config(config, root)?;
    let engine = Engine::from_config(&config)?;
    let project = Project::load(root, &config.project)
        .with_context(|| format!("failed to load project at {}", root.display()))?;
    Ok((config, engine, project))
}

fn cmd_query(expression: &str, root: &Path, config: Option<PathBuf>, json: bool) -> Result<()> {
    let (_config, engine, project) = open(root, config)?;
    let found = engine.evaluate(&project.root(), expression)?;

    if json {
        let items: Vec<_> = found.iter().map(match_json).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for node in &found {
        let tags = node.node_tags().join(", ");
        let position = node
            .as_text()
            .and_then(|text| text.format_info())
            .map(|info| {
                format!(
                    "{}:{}",
                    info.start.line_number_from1, info.start.column_number_from1
                )
            })
            .unwrap_or_default();
        println!(
            "{} {} {}",
            node.address().bold(),
            format!("[{tags}]").cyan(),
            position.dimmed()
        );
        if let Some(text) = node.as_text() {
            println!("    {}", preview(&text.value()));
        }
    }
    println!(
        "{}",
        format!("{} match(es) for {}", found.len(), expression).dimmed()
    );
    Ok(())
}

fn match_json(node: &NodeRef) -> serde_json::Value {
    let text = node.as_text();
    serde_json::json!({
        "address": node.address(),
        "name": node.node_name(),
        "tags": node.node_tags(),
        "value": text.map(|t| t.value()),
        "format": text.and_then(|t| t.format_info()),
    })
}

/// First line of `value`, truncated for terminal output.
fn preview(value: &str) -> String {
    const MAX: usize = 80;
    let line = value.lines().next().unwrap_or("");
    let mut out: String = line.chars().take(MAX).collect();
    if line.chars().count() > MAX || value.lines().nth(1).is_some() {
        out.push_str("...");
    }
    out
}

fn cmd_update(
    expression: &str,
    value: &str,
    root: &Path,
    config: Option<PathBuf>,
    show_diff: bool,
    write: bool,
) -> Result<()> {
    let (_config, engine, project) = open(root, config)?;

    let originals: Vec<(String, String)> = project
        .files()
        .iter()
        .map(|file| (file.path(), file.content()))
        .collect();

    let updated = engine.with(&project.root(), expression, |node: &NodeRef| -> Result<()> {
        let text = node.as_text().with_context(|| {
            format!("{} is not a text node and cannot be updated", node.address())
        })?;
        text.update(value)?;
        Ok(())
    })?;

    let dirty = project.dirty_files();
    println!(
        "Updated {} node(s) in {} file(s)",
        updated.to_string().green(),
        dirty.len()
    );

    if show_diff {
        for file in &dirty {
            let path = file.path();
            let original = originals
                .iter()
                .find(|(p, _)| *p == path)
                .map(|(_, content)| content.as_str())
                .unwrap_or("");
            print_unified_diff(&path, original, &file.content());
        }
    }

    if dirty.is_empty() {
        return Ok(());
    }
    if !write {
        println!("{}", "Dry run, nothing written (pass --write to save)".yellow());
        return Ok(());
    }

    let files: Vec<(PathBuf, String)> = dirty
        .iter()
        .map(|file| (root.join(file.path()), file.content()))
        .collect();
    let written = write_all(&files)?;
    for file in &dirty {
        file.document().mark_clean();
    }
    for path in written {
        println!("  {} {}", "wrote".green(), path.display());
    }
    Ok(())
}

fn cmd_types(config: Option<PathBuf>) -> Result<()> {
    let config = match config {
        Some(path) => load_from_path(&path)?,
        None => load_config(None, Path::new("."))?,
    };
    let engine = Engine::from_config(&config)?;
    for name in engine.registry().type_names() {
        println!("{name}");
    }
    Ok(())
}

/// Unified diff of one file with a few lines of context per hunk.
fn print_unified_diff(path: &str, before: &str, after: &str) {
    let diff = TextDiff::from_lines(before, after);
    let unified = diff
        .unified_diff()
        .context_radius(2)
        .header(&format!("a/{path}"), &format!("b/{path}"))
        .to_string();

    for line in unified.lines() {
        let styled = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else {
            line.normal()
        };
        println!("{styled}");
    }
}

//! cursor-helper - alerts and prompt templates for an AI coding assistant.
//!
//! # Commands
//!
//! - `cursor-helper watch`: Alert on sentinel files until interrupted
//! - `cursor-helper test-notify`: Fire one alert by hand
//! - `cursor-helper rule <kind>`: Print the rule that makes the assistant write a sentinel
//! - `cursor-helper templates ...`: Manage and use prompt templates
//!
//! # Environment Variables
//!
//! See the [`config`] module for available configuration options.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use serde_json::{json, Map};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use cursor_helper::alert::Alerter;
use cursor_helper::config::Config;
use cursor_helper::persistence::JsonFileStore;
use cursor_helper::rules::{rule_for, setup_steps};
use cursor_helper::templates::{
    default_values, extract_variables, NewTemplate, Template, TemplateCategory, TemplateStore,
    TemplateUpdate,
};
use cursor_helper::types::{SentinelKind, WatchEvent};
use cursor_helper::watcher::{ActivityHandler, SentinelWatcher};

/// Source tag for manually triggered alerts.
const TEST_COMMAND_SOURCE: &str = "test-command";

/// cursor-helper - alerts and prompt templates for an AI coding assistant.
///
/// Watches sentinel files the assistant writes and alerts you, and keeps a
/// library of reusable prompt templates.
#[derive(Parser, Debug)]
#[command(name = "cursor-helper")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    CURSOR_HELPER_FLAG_FILE          Task sentinel (default: ~/.cursor-notify.flag)
    CURSOR_HELPER_MESSAGE            Task message (default: Cursor task complete)
    CURSOR_HELPER_PLAY_SOUND         Play a sound with alerts (default: true)
    CURSOR_HELPER_SOUND_PATH         Custom sound file
    CURSOR_HELPER_DEBOUNCE_MS        Quiet period in milliseconds (default: 500)
    CURSOR_HELPER_LOGGING            Debug logging (default: false)
    CURSOR_HELPER_CONTEXT_ENABLED    Watch the context sentinel (default: false)
    CURSOR_HELPER_CONTEXT_THRESHOLD  Percentage quoted in the context rule (default: 80)
    CURSOR_HELPER_CONFIRM_ENABLED    Watch the file confirmation sentinel (default: false)
    CURSOR_HELPER_DATA_DIR           Template library directory (default: ~/.cursor-helper)

EXAMPLES:
    # Print the rule to paste into Rules for AI
    cursor-helper rule task

    # Alert until Ctrl+C
    cursor-helper watch

    # Fill in a template, taking declared defaults for anything not set
    cursor-helper templates use tpl_abc --set fileName=lib.rs --defaults
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the enabled sentinel files and alert on activity.
    ///
    /// Runs until Ctrl+C or SIGTERM.
    Watch,

    /// Fire one alert as if a sentinel had been written.
    TestNotify {
        /// Which alert to fire.
        #[arg(short, long, default_value = "task")]
        kind: SentinelKind,

        /// Also print the synthesized event as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the rule that makes the assistant write a sentinel.
    Rule {
        /// task, context or confirmation.
        kind: SentinelKind,
    },

    /// Manage and use prompt templates.
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
}

/// Template subcommands.
#[derive(Subcommand, Debug)]
enum TemplatesCommand {
    /// List templates, optionally in one category.
    List {
        #[arg(short, long)]
        category: Option<TemplateCategory>,
    },

    /// Show one template in full.
    Show { id: String },

    /// Search names, descriptions, tags and content.
    Search { query: String },

    /// List the placeholders of a template.
    Vars { id: String },

    /// Fill in a template and print the result.
    Use {
        id: String,

        /// Placeholder value as name=value. Repeatable.
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,

        /// Use declared defaults for placeholders not given with --set.
        #[arg(long)]
        defaults: bool,

        /// Write the result to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a template.
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        category: TemplateCategory,

        #[arg(long)]
        description: Option<String>,

        /// Tag. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Template text.
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Read the template text from a file.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Change fields of a template.
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<TemplateCategory>,

        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,

        /// Remove the description.
        #[arg(long)]
        clear_description: bool,

        /// Replace all tags. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,

        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a template.
    Delete { id: String },

    /// Most recently used or edited templates.
    Recent {
        /// How many to show (default: CURSOR_HELPER_RECENT_TEMPLATES).
        count: Option<usize>,
    },

    /// Most used templates.
    Popular {
        #[arg(default_value_t = 5)]
        count: usize,
    },

    /// Write every template to a JSON file.
    Export { file: PathBuf },

    /// Add templates from a JSON file, skipping ids that already exist.
    Import { file: PathBuf },
}

fn main() -> Result<()> {
    let config = Config::from_env();

    // Hide template commands from help when configured to
    let show_templates = config
        .as_ref()
        .map_or(true, |c| c.templates.show_in_palette);
    let mut command = Cli::command();
    if !show_templates {
        command = command.mut_subcommand("templates", |sub| sub.hide(true));
    }
    let cli = Cli::from_arg_matches(&command.get_matches()).unwrap_or_else(|e| e.exit());

    let config = config.context("Failed to load configuration")?;
    init_logging(config.logging);
    debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Watch => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;

            runtime.block_on(run_watch(config))
        }
        Command::TestNotify { kind, json } => run_test_notify(&config, kind, json),
        Command::Rule { kind } => {
            println!("{}", rule_for(kind, &config));
            println!();
            println!("{}", setup_steps(kind));
            Ok(())
        }
        Command::Templates { command } => {
            if !config.templates.enabled {
                bail!("Template commands are disabled (CURSOR_HELPER_TEMPLATES_ENABLED=false)");
            }
            run_templates(&config, command)
        }
    }
}

/// Starts every enabled watcher and waits for a shutdown signal.
async fn run_watch(config: Config) -> Result<()> {
    info!("Starting cursor-helper");

    let alerter: Arc<dyn ActivityHandler> = Arc::new(Alerter::from_config(&config));
    let mut watchers = Vec::new();

    for kind in config.enabled_kinds() {
        let mut watcher = SentinelWatcher::with_shared_handler(
            kind,
            config.watch_config(kind),
            Arc::clone(&alerter),
        );
        watcher.start().with_context(|| {
            format!(
                "Failed to start {} watcher for {}",
                kind,
                config.sentinel(kind).flag_file.display()
            )
        })?;
        watchers.push(watcher);
    }

    info!(
        watchers = watchers.len(),
        "cursor-helper running. Press Ctrl+C to stop."
    );

    wait_for_shutdown().await;

    info!("Shutting down...");
    for watcher in &mut watchers {
        watcher.stop();
    }

    info!("cursor-helper stopped");
    Ok(())
}

/// Fires one alert through the same path a sentinel write takes.
fn run_test_notify(config: &Config, kind: SentinelKind, print_json: bool) -> Result<()> {
    let mut payload = Map::new();
    payload.insert("manual".to_string(), json!(true));

    let event = WatchEvent::new(kind, config.sentinel(kind).flag_file.clone(), payload)
        .with_source(TEST_COMMAND_SOURCE);

    if print_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&event).context("Failed to serialize event")?
        );
    }

    Alerter::from_config(config).on_activity(event);
    Ok(())
}

fn run_templates(config: &Config, command: TemplatesCommand) -> Result<()> {
    let persistence = JsonFileStore::new(&config.data_dir);
    let mut store = TemplateStore::open(persistence).with_context(|| {
        format!(
            "Failed to open template library at {}",
            config.data_dir.display()
        )
    })?;

    match command {
        TemplatesCommand::List { category } => {
            let templates: Vec<&Template> = match category {
                Some(category) => store.by_category(category),
                None => store.all().iter().collect(),
            };
            print_list(&templates, "No templates");
        }
        TemplatesCommand::Show { id } => {
            let template = find(&store, &id)?;
            print_template(template);
        }
        TemplatesCommand::Search { query } => {
            print_list(&store.search(&query), "No templates match");
        }
        TemplatesCommand::Vars { id } => {
            let template = find(&store, &id)?;
            let placeholders = template.placeholders();
            if placeholders.is_empty() {
                println!("No placeholders");
            }
            for placeholder in placeholders {
                let description = placeholder.description.as_deref().unwrap_or("");
                match placeholder.default_value {
                    Some(default) => {
                        println!("{:<20} {description} (default: {default:?})", placeholder.name)
                    }
                    None => println!("{:<20} {description}", placeholder.name),
                }
            }
        }
        TemplatesCommand::Use {
            id,
            set,
            defaults,
            output,
        } => {
            let template = find(&store, &id)?;
            let placeholders = template.placeholders();

            let mut values: HashMap<String, String> = if defaults {
                default_values(&placeholders)
            } else {
                HashMap::new()
            };
            values.extend(set);

            let missing: Vec<&str> = placeholders
                .iter()
                .map(|p| p.name.as_str())
                .filter(|name| !values.contains_key(*name))
                .collect();
            if !missing.is_empty() {
                warn!(missing = ?missing, "Placeholders left unfilled");
                eprintln!("Unfilled placeholders: {}", missing.join(", "));
            }

            let text = store.render(&id, &values)?;
            match output {
                Some(path) => {
                    fs::write(&path, &text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Wrote {}", path.display());
                }
                None => println!("{text}"),
            }
        }
        TemplatesCommand::Add {
            name,
            category,
            description,
            tags,
            content,
            file,
        } => {
            let content = read_content(content, file.as_deref())?
                .context("Template text is required (--content or --file)")?;
            let mut new = NewTemplate::new(name, category, content).with_tags(tags);
            new.description = description;
            let template = store.create(new.with_extracted_variables())?;
            println!("Created {} \"{}\"", template.id, template.name);
        }
        TemplatesCommand::Edit {
            id,
            name,
            category,
            description,
            clear_description,
            tags,
            content,
            file,
        } => {
            let content = read_content(content, file.as_deref())?;
            let variables = content.as_deref().map(extract_variables);
            let changes = TemplateUpdate {
                name,
                description: if clear_description {
                    Some(None)
                } else {
                    description.map(Some)
                },
                category,
                content,
                variables,
                tags: (!tags.is_empty()).then_some(tags),
            };
            if changes.is_empty() {
                bail!("Nothing to change");
            }
            let template = store.update(&id, changes)?;
            println!("Updated {} \"{}\"", template.id, template.name);
        }
        TemplatesCommand::Delete { id } => {
            store.delete(&id)?;
            println!("Deleted {id}");
        }
        TemplatesCommand::Recent { count } => {
            let count = count.unwrap_or(config.templates.recent_count);
            print_list(&store.recent(count), "No recent templates");
        }
        TemplatesCommand::Popular { count } => {
            print_list(&store.popular(count), "No templates");
        }
        TemplatesCommand::Export { file } => {
            let templates = store.export();
            let encoded =
                serde_json::to_string_pretty(&templates).context("Failed to encode templates")?;
            fs::write(&file, encoded)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Exported {} templates to {}", templates.len(), file.display());
        }
        TemplatesCommand::Import { file } => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let batch: Vec<Template> = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not a template export", file.display()))?;
            let offered = batch.len();
            let added = store.import(batch)?;
            println!("Imported {added} of {offered} templates");
        }
    }

    Ok(())
}

fn find<'a, P>(store: &'a TemplateStore<P>, id: &str) -> Result<&'a Template>
where
    P: cursor_helper::persistence::KeyValueStore,
{
    store
        .get(id)
        .with_context(|| format!("Template not found: {id}"))
}

fn read_content(content: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match (content, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => Ok(None),
    }
}

fn print_list(templates: &[&Template], empty: &str) {
    if templates.is_empty() {
        println!("{empty}");
        return;
    }
    for template in templates {
        println!(
            "{}  {:<13}  {}  (used {}x)",
            template.id, template.category, template.name, template.use_count
        );
    }
}

fn print_template(template: &Template) {
    println!("{} ({})", template.name, template.id);
    if let Some(description) = &template.description {
        println!("{description}");
    }
    println!("Category: {}", template.category);
    if !template.tags.is_empty() {
        println!("Tags: {}", template.tags.join(", "));
    }
    println!(
        "Used {} times, updated {}",
        template.use_count,
        template.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!();
    println!("{}", template.content);
}

/// Parses a `name=value` pair for `--set`.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing placeholder name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins; otherwise `debug` when verbose logging is configured and
/// `info` when not. Logs go to stderr so template output stays clean.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::Result;
use std::path::PathBuf;
use todostore::{Backend, Config, OnCorrupt, Storage, TodoFilter, TodoId, TodoStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - a small to-do list kept in a local key-value store")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: <config dir>/todostore/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the stored list
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    /// Storage key the list is kept under
    #[arg(short, long)]
    key: Option<String>,

    /// What to do when the stored list cannot be parsed
    #[arg(long, value_enum)]
    on_corrupt: Option<OnCorrupt>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new todo
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Mark a todo done, or open again
    Toggle { id: TodoId },

    /// Replace the text of a todo
    Edit {
        id: TodoId,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete a todo
    Delete { id: TodoId },

    /// Show todos
    List {
        #[arg(short, long, value_enum, default_value_t = TodoFilter::All)]
        filter: TodoFilter,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = resolve_config(&cli)?;
    let mut store = TodoStore::open(&config)?;
    store.load()?;

    match cli.command {
        Commands::Add { text } => {
            let id = store.add(text.join(" "))?;
            println!("Added {}", id.to_string().bold());
        }
        Commands::Toggle { id } => {
            if store.toggle(id)? {
                let state = match store.get(id) {
                    Some(todo) if todo.completed => "done".green(),
                    _ => "open".yellow(),
                };
                println!("{} is now {}", id, state);
            } else {
                report_missing(id);
            }
        }
        Commands::Edit { id, text } => {
            if store.edit(id, text.join(" "))? {
                println!("Updated {}", id);
            } else {
                report_missing(id);
            }
        }
        Commands::Delete { id } => {
            if store.delete(id)? {
                println!("Deleted {}", id);
            } else {
                report_missing(id);
            }
        }
        Commands::List { filter } => {
            store.set_filter(filter);
            render(&store);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "todostore=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Config file values, overridden by command-line flags
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(key) = &cli.key {
        config.key = key.clone();
    }
    if let Some(policy) = cli.on_corrupt {
        config.on_corrupt = policy;
    }

    Ok(config)
}

fn report_missing(id: TodoId) {
    println!("{}", format!("No todo with id {}", id).dimmed());
}

fn render<S: Storage>(store: &TodoStore<S>) {
    let todos = store.filtered();

    if todos.is_empty() {
        println!("{}", format!("Nothing to show ({})", store.filter()).dimmed());
    }

    for todo in todos {
        let created = todo.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
        let (mark, text) = if todo.completed {
            ("[x]".green(), todo.text.as_str().strikethrough().dimmed())
        } else {
            ("[ ]".normal(), todo.text.as_str().normal())
        };
        println!(
            "{} {} {} {}",
            mark,
            todo.id.to_string().dimmed(),
            text,
            format!("({})", created).dimmed()
        );
    }

    let left = store.active_count();
    println!("{} {} left", left, if left == 1 { "item" } else { "items" });
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskdeck::errors::{BoardError, GENERAL_ERROR};

mod cmd;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version, about = "Persistent kanban board for coding agents")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the .taskdeck store (defaults to the current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the board with the configured columns
    Init {
        /// Board name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Add a task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Target column (defaults to the configured default column)
        #[arg(short, long)]
        column: Option<String>,
        #[arg(long)]
        creator: Option<String>,
        /// low, medium, or high
        #[arg(short, long)]
        priority: Option<String>,
        /// Task ids this one depends on
        #[arg(long, value_delimiter = ',')]
        depends_on: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        files: Vec<String>,
        #[arg(short, long, value_delimiter = ',')]
        labels: Vec<String>,
    },
    /// List tasks in board order
    List {
        #[arg(short, long)]
        column: Option<String>,
        #[arg(long)]
        creator: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        /// Only tasks with a blocked-reason
        #[arg(long)]
        blocked: bool,
        /// Include archived tasks
        #[arg(long)]
        archived: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show one task
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Move a task to a column
    Move {
        id: String,
        column: String,
        /// Override the target column's WIP limit
        #[arg(long)]
        force: bool,
    },
    /// Move a task to the terminal column
    Done {
        id: String,
        #[arg(long)]
        force: bool,
    },
    /// Update task fields
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// RFC 3339 due date, e.g. 2026-08-14T12:00:00Z
        #[arg(long)]
        due: Option<String>,
        #[arg(long, value_delimiter = ',')]
        files: Option<Vec<String>>,
        #[arg(long, value_delimiter = ',')]
        labels: Option<Vec<String>>,
        #[arg(long)]
        blocked_reason: Option<String>,
        #[arg(long)]
        clear_blocked: bool,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        clear_parent: bool,
        /// Reject the update if the stored version differs
        #[arg(long)]
        expected_version: Option<i64>,
    },
    /// Delete a task permanently
    Delete { id: String },
    /// Archive tasks by ids, column, and/or age (criteria combine with AND)
    Archive {
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<String>>,
        #[arg(long)]
        column: Option<String>,
        /// Tasks not updated in this many days
        #[arg(long)]
        older_than_days: Option<i64>,
    },
    /// Restore an archived task
    Restore {
        id: String,
        /// Column to restore into (defaults to where it was archived)
        #[arg(long)]
        column: Option<String>,
    },
    /// Search archived tasks by title/description
    SearchArchive {
        #[arg(default_value = "")]
        query: String,
        #[arg(long, default_value = "20")]
        limit: i64,
        #[arg(long, default_value = "0")]
        offset: i64,
    },
    /// Hard-delete archived tasks
    Purge {
        /// Only tasks archived more than this many days ago
        #[arg(long)]
        older_than_days: Option<i64>,
    },
    /// Link two tasks (blocks, blocked_by, or related)
    Link {
        from: String,
        to: String,
        #[arg(long = "type", default_value = "blocks")]
        link_type: String,
    },
    /// Remove a link
    Unlink {
        from: String,
        to: String,
        #[arg(long = "type", default_value = "blocks")]
        link_type: String,
    },
    /// Show a task's links
    Links { id: String },
    /// Show what blocks a task
    Blockers { id: String },
    /// Rank actionable tasks by score
    Next {
        #[arg(long, default_value = "5")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Reconcile an external todo batch (JSON file, or - for stdin)
    Sync {
        #[arg(default_value = "-")]
        input: String,
        #[arg(long)]
        json: bool,
    },
    /// Board summary
    Status,
    /// Permanently delete every task on the board
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "taskdeck=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {:#}", err);
        let code = err
            .downcast_ref::<BoardError>()
            .map(BoardError::code)
            .unwrap_or(GENERAL_ERROR);
        std::process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match &cli.command {
        Commands::Init { name } => cmd::cmd_init(&project_dir, name.as_deref())?,
        Commands::Add {
            title,
            description,
            column,
            creator,
            priority,
            depends_on,
            files,
            labels,
        } => cmd::cmd_add(
            &project_dir,
            cmd::task::AddArgs {
                title: title.clone(),
                description: description.clone(),
                column: column.clone(),
                creator: creator.clone(),
                priority: priority.clone(),
                depends_on: depends_on.clone(),
                files: files.clone(),
                labels: labels.clone(),
            },
        )?,
        Commands::List {
            column,
            creator,
            assignee,
            blocked,
            archived,
            json,
        } => cmd::cmd_list(
            &project_dir,
            cmd::task::ListArgs {
                column: column.clone(),
                creator: creator.clone(),
                assignee: assignee.clone(),
                blocked: *blocked,
                archived: *archived,
                json: *json,
            },
        )?,
        Commands::Show { id, json } => cmd::cmd_show(&project_dir, id, *json)?,
        Commands::Move { id, column, force } => cmd::cmd_move(&project_dir, id, column, *force)?,
        Commands::Done { id, force } => cmd::cmd_done(&project_dir, id, *force)?,
        Commands::Update {
            id,
            title,
            description,
            assignee,
            priority,
            due,
            files,
            labels,
            blocked_reason,
            clear_blocked,
            parent,
            clear_parent,
            expected_version,
        } => cmd::cmd_update(
            &project_dir,
            id,
            cmd::task::UpdateArgs {
                title: title.clone(),
                description: description.clone(),
                assignee: assignee.clone(),
                priority: priority.clone(),
                due: due.clone(),
                files: files.clone(),
                labels: labels.clone(),
                blocked_reason: blocked_reason.clone(),
                clear_blocked: *clear_blocked,
                parent: parent.clone(),
                clear_parent: *clear_parent,
                expected_version: *expected_version,
            },
        )?,
        Commands::Delete { id } => cmd::cmd_delete(&project_dir, id)?,
        Commands::Archive {
            ids,
            column,
            older_than_days,
        } => cmd::cmd_archive(&project_dir, ids.clone(), column.clone(), *older_than_days)?,
        Commands::Restore { id, column } => {
            cmd::cmd_restore(&project_dir, id, column.as_deref())?
        }
        Commands::SearchArchive {
            query,
            limit,
            offset,
        } => cmd::cmd_search_archive(&project_dir, query, *limit, *offset)?,
        Commands::Purge { older_than_days } => cmd::cmd_purge(&project_dir, *older_than_days)?,
        Commands::Link {
            from,
            to,
            link_type,
        } => cmd::cmd_link(&project_dir, from, to, link_type)?,
        Commands::Unlink {
            from,
            to,
            link_type,
        } => cmd::cmd_unlink(&project_dir, from, to, link_type)?,
        Commands::Links { id } => cmd::cmd_links(&project_dir, id)?,
        Commands::Blockers { id } => cmd::cmd_blockers(&project_dir, id)?,
        Commands::Next { limit, json } => cmd::cmd_next(&project_dir, *limit, *json)?,
        Commands::Sync { input, json } => cmd::cmd_sync(&project_dir, input, *json)?,
        Commands::Status => cmd::cmd_status(&project_dir)?,
        Commands::Reset { force } => cmd::cmd_reset(&project_dir, *force)?,
    }

    Ok(())
}

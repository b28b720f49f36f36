//! oxide-alter CLI
//!
//! Prints the statements that apply a recorded action log to a table.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_alter_core::adapter::{
    gen_delete_table_cmd, gen_rename_table_cmd, gen_truncate_table_cmd, generate_alter_statements,
};
use oxide_alter_core::sqlite::parse_create_table;
use oxide_alter_core::{Action, ActionLog, Dialect, GenerateContext, GenerateOptions};

/// Schema alteration statements for PostgreSQL, MySQL, SQL Server, Oracle and SQLite.
#[derive(Parser)]
#[command(name = "oxide-alter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target dialect (postgres, mysql, mssql, oracle, sqlite).
    #[arg(short, long, env = "OXIDE_ALTER_DIALECT", default_value = "postgres")]
    dialect: String,

    /// JSON file with generation options.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the statements for an action log.
    Generate {
        /// JSON file holding an array of actions or a saved action log.
        #[arg(short, long)]
        actions: PathBuf,

        /// File with the table's current CREATE TABLE statement (SQLite).
        #[arg(long)]
        ddl: Option<PathBuf>,

        /// Files with the table's CREATE INDEX statements (SQLite).
        #[arg(long)]
        index_ddl: Vec<PathBuf>,

        /// Wrap the output in a transaction block.
        #[arg(long)]
        transaction: bool,
    },

    /// Parse a SQLite CREATE TABLE statement and print its structure as JSON.
    Parse {
        /// File with the CREATE TABLE statement.
        #[arg(long)]
        ddl: PathBuf,
    },

    /// Rename a table.
    RenameTable {
        /// Current name.
        old: String,
        /// New name.
        new: String,
    },

    /// Remove every row of a table.
    Truncate {
        /// Table name.
        table: String,
    },

    /// Drop a table.
    Drop {
        /// Table name.
        table: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    for line in run(&cli)? {
        println!("{line}");
    }
    Ok(())
}

/// Executes a parsed command line, returning the lines to print.
fn run(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let dialect: Dialect = cli.dialect.parse()?;

    match &cli.command {
        Commands::Generate {
            actions,
            ddl,
            index_ddl,
            transaction,
        } => {
            let mut options = load_options(cli.config.as_deref())?;
            options.transactional |= *transaction;

            let mut ctx = GenerateContext::new().with_options(options);
            if let Some(path) = ddl {
                ctx = ctx.with_table_ddl(read(path)?);
            }
            let mut indexes = Vec::new();
            for path in index_ddl {
                indexes.extend(split_statements(&read(path)?));
            }
            ctx = ctx.with_index_ddl(indexes);

            let actions = load_actions(actions)?;
            info!(dialect = %dialect, actions = actions.len(), "Generating statements");
            let statements = generate_alter_statements(dialect, &actions, &ctx)?;
            if statements.is_empty() {
                info!("Nothing to change.");
            }
            Ok(statements)
        }

        Commands::Parse { ddl } => {
            let structure = parse_create_table(&read(ddl)?)?;
            Ok(vec![serde_json::to_string_pretty(&structure)?])
        }

        Commands::RenameTable { old, new } => Ok(vec![gen_rename_table_cmd(dialect, old, new)]),

        Commands::Truncate { table } => Ok(vec![gen_truncate_table_cmd(dialect, table)]),

        Commands::Drop { table } => Ok(vec![gen_delete_table_cmd(dialect, table)]),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_options(path: Option<&Path>) -> anyhow::Result<GenerateOptions> {
    let Some(path) = path else {
        return Ok(GenerateOptions::default());
    };
    let options = serde_json::from_str(&read(path)?)
        .with_context(|| format!("Invalid options in {}", path.display()))?;
    debug!(path = %path.display(), "Loaded generation options");
    Ok(options)
}

/// Reads either a JSON array of actions or a serialized [`ActionLog`].
fn load_actions(path: &Path) -> anyhow::Result<Vec<Action>> {
    let text = read(path)?;
    if let Ok(actions) = serde_json::from_str::<Vec<Action>>(&text) {
        return Ok(actions);
    }
    let log: ActionLog = serde_json::from_str(&text)
        .with_context(|| format!("Invalid action log in {}", path.display()))?;
    Ok(log.actions())
}

/// Splits a file of DDL statements on semicolons outside quotes.
fn split_statements(text: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' || c == '`' => quote = Some(c),
            None if c == ';' => {
                let statement = current.trim();
                if !statement.is_empty() {
                    statements.push(format!("{statement};"));
                }
                current.clear();
                continue;
            }
            None => {}
        }
        current.push(c);
    }
    let rest = current.trim();
    if !rest.is_empty() {
        statements.push(format!("{rest};"));
    }
    statements
}

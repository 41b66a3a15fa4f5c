//! SQL Chat CLI
//!
//! Terminal front end: load a SQL file, then ask questions about it.

use anyhow::Context;
use clap::Parser;
use sql_chat::logging::{self, LogFormat};
use sql_chat::{ChatClient, Config, Pipeline, PipelineEvent, PipelineStage, SessionContext};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// SQL Chat - ask natural-language questions about a SQL file
#[derive(Parser)]
#[command(name = "sqlchat")]
#[command(about = "Load a SQL file into an in-memory database and ask questions about it", long_about = None)]
#[command(version)]
struct Cli {
    /// SQL file to load at start-up
    script: Option<PathBuf>,

    /// Config file (default: ~/.sqlchat/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model name; also selects the provider (overrides config)
    #[arg(long, env = "SQLCHAT_MODEL")]
    model: Option<String>,

    /// Default row limit suggested to the model
    #[arg(long)]
    top_k: Option<usize>,

    /// Allow synthesized statements that modify the loaded database
    #[arg(long)]
    allow_writes: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// REPL command entered with a leading `:`.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Load(String),
    Schema,
    History,
    Clear,
    ClearHistory,
    Help,
    Quit,
    Unknown(String),
}

/// Parse a `:command` line; `None` if the line is a question.
fn parse_command(line: &str) -> Option<Command> {
    let rest = line.trim().strip_prefix(':')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    Some(match name {
        "load" | "upload" if !arg.is_empty() => Command::Load(arg.to_string()),
        "schema" => Command::Schema,
        "history" => Command::History,
        "clear" => Command::Clear,
        "clear-history" => Command::ClearHistory,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(rest.to_string()),
    })
}

const HELP: &str = "\
Type a question and press Enter. End a line with \\ to continue the question on the next line.

Commands:
  :load <file>      Load a SQL file (replaces the current database)
  :schema           Show the database schema
  :history          Show questions and answers, most recent first
  :clear            Discard the question being typed
  :clear-history    Forget all questions and answers
  :help             Show this help
  :quit             Exit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, &cli.log_level)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(top_k) = cli.top_k {
        config.top_k = top_k;
    }
    if cli.allow_writes {
        config.read_only = false;
    }
    config.validate()?;

    let client = ChatClient::from_config(&config).context("cannot create model client")?;
    let pipeline = Pipeline::new(Arc::new(client), &config);
    let mut session = SessionContext::with_sample_rows(config.sample_rows);

    println!("💬 SQL Chat ({})", config.model);
    println!("Load a SQL file and ask questions about your database. Type :help for commands.");

    if let Some(path) = &cli.script {
        cmd_load(&mut session, &path.to_string_lossy());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(&session);
        let Some(line) = lines.next_line().await? else {
            break;
        };

        if session.pending().is_empty() {
            if let Some(command) = parse_command(&line) {
                match command {
                    Command::Load(path) => cmd_load(&mut session, &path),
                    Command::Schema => cmd_schema(&session),
                    Command::History => cmd_history(&session),
                    Command::Clear => session.clear_pending(),
                    Command::ClearHistory => {
                        session.clear_history();
                        println!("✓ History cleared");
                    }
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                    Command::Unknown(cmd) => println!("Unknown command ':{}'. Type :help.", cmd),
                }
                continue;
            }
        } else if parse_command(&line) == Some(Command::Clear) {
            session.clear_pending();
            continue;
        }

        if let Some(partial) = line.strip_suffix('\\') {
            session.push_pending(partial);
            continue;
        }
        session.push_pending(&line);
        let question = session.take_pending();
        if question.trim().is_empty() {
            continue;
        }

        cmd_ask(&pipeline, &mut session, &question, &config.model).await;
    }

    Ok(())
}

fn print_prompt(session: &SessionContext) {
    let prompt = if !session.pending().is_empty() {
        "... "
    } else if session.has_database() {
        "? "
    } else {
        "(no database) "
    };
    print!("{}", prompt);
    let _ = std::io::stdout().flush();
}

fn cmd_load(session: &mut SessionContext, path: &str) {
    let path = PathBuf::from(shellexpand::tilde(path).to_string());
    match session.load_file(&path) {
        Ok(store) => {
            println!("✓ Database initialized successfully!");
            for table in store.tables() {
                println!("  {} ({})", table.name, table.column_names().join(", "));
            }
        }
        Err(e) => {
            println!("✗ {}", e.user_message());
            if !session.has_database() {
                println!("Please load a SQL file to begin.");
            }
        }
    }
}

fn cmd_schema(session: &SessionContext) {
    match session.schema_description() {
        Ok(description) if description.is_empty() => println!("(the database has no tables)"),
        Ok(description) => println!("{}", description),
        Err(e) => println!("{}", e.user_message()),
    }
}

fn cmd_history(session: &SessionContext) {
    if session.log().is_empty() {
        println!("(no questions yet)");
        return;
    }
    println!("### Chat History");
    for entry in session.log().all() {
        println!();
        println!("[{}]", entry.asked_at().format("%H:%M:%S"));
        println!("Q: {}", entry.question());
        println!("A: {}", entry.answer());
        println!("---");
    }
}

async fn cmd_ask(pipeline: &Pipeline, session: &mut SessionContext, question: &str, model: &str) {
    let mut stdout = std::io::stdout();
    let outcome = pipeline
        .ask(session, question, |event| match event {
            PipelineEvent::Stage(PipelineStage::Synthesizing) => println!("Generating response..."),
            PipelineEvent::Query(sql) => println!("SQL: {}\n", sql),
            PipelineEvent::Fragment(text) => {
                print!("{}", text);
                let _ = stdout.flush();
            }
            PipelineEvent::Stage(_) => {}
        })
        .await;

    match outcome {
        Ok(turn) if turn.result.is_empty() => println!("\n(the query returned no rows)\n"),
        Ok(_) => println!("\n"),
        Err(e) => {
            println!("\n✗ {}", e.user_message());
            if e.is_remote() {
                println!("  Check the API key for {} and your network connection.", model);
            }
            println!();
        }
    }
}

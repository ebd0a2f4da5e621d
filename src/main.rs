use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use query_whisperer::conversation::{ChatAgent, ChatOptions, ConsoleResponder, ConversationPort, OpenAiBackend};
use query_whisperer::ingestion::csv::delimiter_from_char;
use query_whisperer::ingestion::{ingest_from_path, IngestionOptions, TracingObserver};
use query_whisperer::query::{QueryBuilder, QueryOptions, TracingQueryObserver, WhisperSession};

#[derive(Parser)]
#[command(name = "query-whisperer")]
#[command(about = "Build table queries one choice at a time, answered by you or by a chat model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a query string and print the choices valid next, the suggestion first
    Suggest {
        #[command(flatten)]
        input: InputArgs,

        /// Dot-separated query typed so far (e.g. "SortBy.Age")
        #[arg(short, long, default_value = "")]
        query: String,

        /// Ask the next round on this terminal instead of the chat model
        #[arg(long)]
        console: bool,

        /// Also print the table produced by the committed transformations
        #[arg(long)]
        table: bool,

        /// Print the whole pass outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a query round by round until `Empty` is chosen, then print the table
    Interactive {
        #[command(flatten)]
        input: InputArgs,

        /// Let the chat model propose every step
        #[arg(long)]
        auto: bool,

        /// Upper bound on passes (one per added token)
        #[arg(long, default_value_t = 32)]
        max_passes: usize,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input table (.csv, .tsv)
    input: PathBuf,

    /// Field delimiter (defaults by extension)
    #[arg(short, long)]
    delimiter: Option<char>,

    /// What the query should do, in plain words (steers the chat model)
    #[arg(short, long)]
    request: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Invalid answers tolerated per round
    #[arg(long, default_value_t = 5)]
    max_attempts: usize,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Suggest {
            input,
            query,
            console,
            table,
            json,
        } => {
            if console {
                let session = open_session(&input, console_port())?;
                suggest(session, &query, table, json)
            } else {
                let session = open_session(&input, chat_port(&input)?)?;
                suggest(session, &query, table, json)
            }
        }
        Command::Interactive {
            input,
            auto,
            max_passes,
        } => {
            if auto {
                let session = open_session(&input, chat_port(&input)?)?;
                interactive(session, max_passes)
            } else {
                let session = open_session(&input, console_port())?;
                interactive(session, max_passes)
            }
        }
    }
}

type Console = ConsoleResponder<io::StdinLock<'static>, io::Stdout>;

fn console_port() -> Console {
    ConsoleResponder::new(io::stdin().lock(), io::stdout())
}

fn chat_port(input: &InputArgs) -> Result<ChatAgent<OpenAiBackend>> {
    let options = ChatOptions::from_env_with_key(input.api_key.clone())
        .context("the chat model needs an API key; pass --api-key or use --console")?;
    info!(model = %options.model, base_url = %options.base_url, "using chat backend");
    Ok(ChatAgent::new(OpenAiBackend::new(options)?))
}

fn open_session<P: ConversationPort>(input: &InputArgs, port: P) -> Result<WhisperSession<P>> {
    let delimiter = input.delimiter.map(delimiter_from_char).transpose()?;
    let options = IngestionOptions {
        delimiter,
        observer: Some(Arc::new(TracingObserver)),
        ..Default::default()
    };
    let dataset = ingest_from_path(&input.input, &options)
        .with_context(|| format!("reading {}", input.input.display()))?;

    let builder = QueryBuilder::new(port)
        .with_options(QueryOptions {
            max_attempts: input.max_attempts,
            ..Default::default()
        })
        .with_observer(Arc::new(TracingQueryObserver));

    let mut session = WhisperSession::new(builder);
    session.load_dataset(dataset);
    if let Some(request) = &input.request {
        session.load_user_request(request);
    }
    Ok(session)
}

fn suggest<P: ConversationPort>(mut session: WhisperSession<P>, query: &str, table: bool, json: bool) -> Result<()> {
    let moves = session.process_input(query)?;

    if json {
        if let Some(outcome) = session.last_outcome() {
            println!("{}", serde_json::to_string_pretty(outcome)?);
        }
    } else {
        for (i, choice) in moves.iter().enumerate() {
            println!("[{i}] {choice}");
        }
    }

    if table {
        print_table(&session)?;
    }
    Ok(())
}

fn interactive<P: ConversationPort>(mut session: WhisperSession<P>, max_passes: usize) -> Result<()> {
    let outcome = session.auto_complete(max_passes)?;
    println!("Query: {}", session.query());
    if !outcome.finished {
        info!(passes = max_passes, "stopped before the query was finished");
    }
    print_table(&session)
}

fn print_table<P: ConversationPort>(session: &WhisperSession<P>) -> Result<()> {
    match session.current_table()? {
        Some(table) => print!("{table}"),
        None => println!("(no transformations applied)"),
    }
    Ok(())
}

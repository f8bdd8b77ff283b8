use anyhow::Result;
use clap::{Parser, Subcommand};
use docqa::{Reply, Session};
use docqa_core::{Corpus, DEFAULT_MAX_CHARS, DEFAULT_TOP_K};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions over local text files with TF-IDF retrieval", long_about = None)]
struct Cli {
    /// Fallback directory for relative paths that are not found as given
    #[arg(long, global = true, env = "DOCQA_DOCS_DIR", default_value = "./docs")]
    docs_dir: PathBuf,
    /// Maximum characters per chunk
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CHARS)]
    max_chars: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (type 'help' for commands)
    Shell,
    /// Load files and folders, then answer one question
    Ask {
        question: String,
        /// File to load (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,
        /// Folder whose .txt/.md/.log files are loaded (repeatable)
        #[arg(long = "folder")]
        folders: Vec<String>,
        /// Number of matches to print
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
    /// Load files and folders, then list what was indexed
    List {
        #[arg(long = "file")]
        files: Vec<String>,
        #[arg(long = "folder")]
        folders: Vec<String>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();
    let base_dir = std::env::current_dir()?;
    let session = Session::new(Corpus::with_max_chars(cli.max_chars), base_dir, cli.docs_dir);

    match cli.command {
        Commands::Shell => run_shell(session),
        Commands::Ask { question, files, folders, k } => {
            let session = preload(session.with_top_k(k), &files, &folders);
            println!("{}", session.ask(&question).text());
            Ok(())
        }
        Commands::List { files, folders } => {
            let session = preload(session, &files, &folders);
            println!("{}", session.list_docs().text());
            Ok(())
        }
    }
}

/// Ingest everything first and rebuild once, instead of once per file.
fn preload(session: Session, files: &[String], folders: &[String]) -> Session {
    let mut session = session.with_auto_rebuild(false);
    for f in folders {
        report(session.load_folder(f));
    }
    for f in files {
        report(session.load_file(f));
    }
    session.rebuild();
    session
}

fn report(result: Result<Reply>) {
    match result {
        Ok(reply) => eprintln!("{}", reply.text()),
        Err(e) => eprintln!("error: {e:#}"),
    }
}

fn run_shell(mut session: Session) -> Result<()> {
    println!("docqa ready. Type 'help' to begin. Ctrl+C to quit.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            println!();
            break;
        };
        match session.respond(&line?) {
            Reply::Text(text) => println!("{text}"),
            Reply::Quit(text) => {
                println!("{text}");
                break;
            }
        }
    }
    Ok(())
}

use doc_qa_agent::api::{self, AppState};
use doc_qa_agent::commands::{print_documents, run_repl, CommandHandler};
use doc_qa_agent::config::AppConfig;
use doc_qa_agent::database::Database;
use doc_qa_agent::knowledge_base::{open_vector_store, KnowledgeBase, KnowledgeBaseBuilder};
use doc_qa_agent::llm::Assistant;
use doc_qa_agent::providers::{CompletionProvider, OpenAIProvider};
use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dotenv::dotenv;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Answer questions about Hindi PDF and DOCX documents", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Folder holding the .pdf and .docx files to index
    #[arg(long, global = true)]
    data_folder: Option<PathBuf>,

    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Start the web server (default)
    Serve,
    /// Ask questions in the terminal
    Chat {
        /// Name used for greetings and the conversation log
        #[arg(long, default_value = "friend")]
        name: String,
    },
    /// Build the knowledge base and report what was indexed
    Ingest,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(folder) = args.data_folder {
        config.data_folder = folder;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_api_server(&config).await,
        Command::Chat { name } => run_cli_mode(&config, &name).await,
        Command::Ingest => run_ingest(&config).await,
    }
}

async fn build_knowledge_base(config: &AppConfig) -> Result<KnowledgeBase, BoxError> {
    let provider: Arc<dyn CompletionProvider> = Arc::new(OpenAIProvider::new(&config.provider));
    log::info!("Using {}", provider.model_info());

    let store = open_vector_store(config).await?;
    let kb = KnowledgeBaseBuilder::from_config(config, provider.clone())?
        .build(&config.data_folder, provider, store)
        .await?;
    Ok(kb)
}

async fn run_ingest(config: &AppConfig) -> Result<(), BoxError> {
    let kb = build_knowledge_base(config).await?;
    print_documents(&kb.stats);
    Ok(())
}

async fn run_cli_mode(config: &AppConfig, name: &str) -> Result<(), BoxError> {
    let kb = build_knowledge_base(config).await?;
    let assistant = Arc::new(Assistant::new(kb.qa, config.answer_cache_size));

    let db = match Database::new(&config.database_path).await {
        Ok(db) => Some(db),
        Err(e) => {
            log::warn!("Conversation log disabled: {}", e);
            None
        }
    };

    let handler = CommandHandler::new(assistant, db, Arc::new(kb.stats), name.to_string());
    run_repl(handler)
        .await
        .map_err(|e| format!("Console error: {}", e))?;
    Ok(())
}

async fn run_api_server(config: &AppConfig) -> Result<(), BoxError> {
    let kb = build_knowledge_base(config).await?;
    let assistant = Arc::new(Assistant::new(kb.qa, config.answer_cache_size));
    let db = Database::new(&config.database_path).await?;

    let app = api::create_api(AppState::new(assistant, db, kb.stats));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("{} http://{}", "Server listening on".green(), addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}

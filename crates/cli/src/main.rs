//! # medibot: Command-Line Client
//!
//! Uploads prescriptions to a `medibot-server`, then sends the user on to the
//! chat page. Also offers sign-in, transcript summaries and upload history.

mod api_client;
mod form;
mod session;

use anyhow::{anyhow, bail, Result};
use api_client::ApiClient;
use clap::{Parser, Subcommand};
use form::{FormState, UploadForm};
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the MediBot server
    #[arg(long, global = true, env = "MEDIBOT_SERVER_URL", default_value = "http://localhost:9090")]
    server: String,
    /// Page opened after a successful upload or a skip
    #[arg(long, global = true, env = "MEDIBOT_CHAT_URL", default_value = "http://localhost:3000/chat")]
    chat_url: String,
    /// Where the signed-in user is remembered
    #[arg(long, global = true, env = "MEDIBOT_SESSION_FILE", default_value = ".medibot_session.json")]
    session_file: PathBuf,
    /// Print the chat URL instead of opening a browser
    #[arg(long, global = true)]
    no_open: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Remember the email used to identify uploads
    Login(LoginArgs),
    /// Forget the stored email
    Logout,
    /// Upload a prescription PDF, then continue to the chat
    Upload(UploadArgs),
    /// Continue to the chat without uploading
    Skip,
    /// Summarize a saved chat transcript
    Summarize(SummarizeArgs),
    /// List the prescriptions uploaded by the signed-in user
    Prescriptions(EmailArgs),
}

#[derive(Parser, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
}

#[derive(Parser, Debug)]
struct UploadArgs {
    /// The PDF file to upload
    file: PathBuf,
    /// Overrides the signed-in email
    #[arg(long)]
    email: Option<String>,
}

#[derive(Parser, Debug)]
struct SummarizeArgs {
    /// A text file holding the conversation
    #[arg(long)]
    file: PathBuf,
    #[arg(long)]
    email: Option<String>,
}

#[derive(Parser, Debug)]
struct EmailArgs {
    #[arg(long)]
    email: Option<String>,
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging to a file
    let log_file = File::create("medibot-cli.log")?;
    let subscriber = fmt::Subscriber::builder()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Login(args) => handle_login(&cli, args),
        Commands::Logout => handle_logout(&cli),
        Commands::Upload(args) => handle_upload(&cli, args).await,
        Commands::Skip => go_to_chat(&cli),
        Commands::Summarize(args) => handle_summarize(&cli, args).await,
        Commands::Prescriptions(args) => handle_prescriptions(&cli, args).await,
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
    Ok(())
}

// --- Command Handlers ---

fn handle_login(cli: &Cli, args: &LoginArgs) -> Result<()> {
    let email = args.email.trim();
    if email.is_empty() {
        bail!("Email must not be empty");
    }
    session::write_session(&cli.session_file, email)?;
    println!("Signed in as {email}");
    Ok(())
}

fn handle_logout(cli: &Cli) -> Result<()> {
    if session::clear_session(&cli.session_file)? {
        println!("Signed out");
    } else {
        println!("No active session");
    }
    Ok(())
}

/// The email given on the command line, else the one in the session file.
/// Empty when neither is set.
fn resolve_email(cli: &Cli, explicit: Option<&str>) -> Result<String> {
    if let Some(email) = explicit.filter(|e| !e.trim().is_empty()) {
        return Ok(email.to_string());
    }
    Ok(session::read_session(&cli.session_file)?
        .map(|s| s.user_email)
        .unwrap_or_default())
}

async fn handle_upload(cli: &Cli, args: &UploadArgs) -> Result<()> {
    let user_email = resolve_email(cli, args.email.as_deref())?;
    let mut form = UploadForm::new();

    let bytes = std::fs::read(&args.file)
        .map_err(|e| anyhow!("Cannot read {:?}: {e}", args.file))?;
    if let FormState::Error(message) = form.select(&args.file, bytes) {
        bail!("{message}");
    }

    let file = match form.begin_upload() {
        Some(file) => file,
        None => bail!("{}", form::NO_FILE_MESSAGE),
    };
    println!("Uploading {}...", file.file_name);

    let client = ApiClient::new(cli.server.clone());
    let outcome = client.upload_prescription(file, &user_email).await;

    match form.finish(outcome) {
        FormState::Success {
            message,
            record,
            redirect_after,
        } => {
            info!(id = %record.id, "Upload complete.");
            println!("{message}");
            println!("Redirecting to chat...");
            tokio::time::sleep(*redirect_after).await;
            go_to_chat(cli)
        }
        FormState::Error(message) => bail!("{message}"),
        other => bail!("Unexpected form state: {other:?}"),
    }
}

fn go_to_chat(cli: &Cli) -> Result<()> {
    open_url(&cli.chat_url, cli.no_open)
}

fn open_url(url: &str, no_open: bool) -> Result<()> {
    if no_open {
        println!("Open {url} to continue.");
        return Ok(());
    }
    info!("Opening {}", url);
    open::that(url).map_err(|e| anyhow!("Failed to open browser at {url}: {e}"))
}

async fn handle_summarize(cli: &Cli, args: &SummarizeArgs) -> Result<()> {
    let transcript = read_transcript(&args.file)?;
    let user_email = resolve_email(cli, args.email.as_deref())?;

    let client = ApiClient::new(cli.server.clone());
    let summary = client.summarize(&transcript, &user_email).await?;
    println!("{summary}");
    Ok(())
}

fn read_transcript(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| anyhow!("Cannot read transcript {path:?}: {e}"))
}

async fn handle_prescriptions(cli: &Cli, args: &EmailArgs) -> Result<()> {
    let user_email = resolve_email(cli, args.email.as_deref())?;
    if user_email.is_empty() {
        bail!("Not signed in. Run `medibot login --email <EMAIL>` first.");
    }

    let client = ApiClient::new(cli.server.clone());
    let records = client.list_prescriptions(&user_email).await?;
    if records.is_empty() {
        println!("No prescriptions uploaded yet.");
    }
    for record in records {
        println!("{}  {}  {}", record.created_at, record.id, record.file_path);
    }
    Ok(())
}

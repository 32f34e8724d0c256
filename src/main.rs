mod api;
mod cli;
mod config;
mod pages;
mod routes;
mod session;
mod transcript;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "biblio", about = "An interactive library management client")]
pub struct Args {
    #[arg(
        short,
        long,
        help = "One-shot command mode (semicolon-separated commands)"
    )]
    pub command: Option<String>,

    #[arg(long, env = "BIBLIO_BASE_URL", help = "API base URL (overrides config)")]
    pub base_url: Option<String>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Session transcripts directory")]
    pub transcripts_dir: Option<PathBuf>,

    #[arg(long, help = "Verbose output (print API activity)")]
    pub verbose: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_default()
    };

    if let Some(base_url) = &args.base_url {
        cfg.api.base_url = base_url.clone();
    }

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error: {}", error);
        }
        return Err(anyhow::anyhow!("invalid configuration"));
    }

    let transcripts_dir = args
        .transcripts_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(".biblio").join("sessions"));
    std::fs::create_dir_all(&transcripts_dir)?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let transcript_path = transcripts_dir.join(format!("{}.jsonl", session_id));
    let mut transcript = transcript::Transcript::new(&transcript_path, &session_id)?;
    transcript.session_start(&cfg.api.base_url)?;

    let api = api::HttpClient::new(&cfg.api.base_url, cfg.api.timeout_ms, cfg.auth.users.clone());

    let ctx = cli::Context {
        session_id,
        transcript: RefCell::new(transcript),
        session: RefCell::new(session::Session::new()),
        current_page: RefCell::new(routes::Page::Home),
        catalog: RefCell::new(pages::catalog::CatalogPage::new()),
        records: RefCell::new(pages::records::RecordsPage::new(cfg.ui.records_limit)),
        returns: RefCell::new(pages::returns::ReturnDesk::new(cfg.ui.message_ttl_secs)),
        readers: RefCell::new(pages::readers::ReadersPage::new()),
        api: Box::new(api),
        config: cfg,
        args,
    };

    if let Some(script) = &ctx.args.command {
        cli::run_once(&ctx, script)
    } else {
        cli::run_repl(ctx)
    }
}

mod shell;
mod terminal;

use std::io::{self, ErrorKind, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dermascan_contracts::events::EventWriter;
use dermascan_contracts::profiles::ProfileRegistry;
use dermascan_engine::{
    build_analyzer, read_image_file, AnalysisOutcome, AnalysisSession, AnalyzerConfig,
    CredentialGate, CredentialHost, ImageAnalyzer, SessionError, SessionKeyHost, UploadPolicy,
};
use tracing_subscriber::EnvFilter;

use crate::shell::{write_outcome, SessionShell, ShellFlow};
use crate::terminal::{save_result, write_profiles, write_views, TerminalKeySelector, GATE_NOTICE};

const LOG_ENV: &str = "DERMASCAN_LOG";

const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_UNAUTHORIZED: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "dermascan", version, about = "Multi-spectral facial skin analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive analysis session.
    Session(SessionArgs),
    /// Analyze one photo and write the composite report.
    Analyze(AnalyzeArgs),
    /// List the six views of the composite grid.
    Views,
    /// List analysis profiles.
    Profiles,
}

#[derive(Debug, Parser)]
struct SessionArgs {
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    events: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    events: Option<PathBuf>,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("dermascan error: {err:#}");
            std::process::exit(EXIT_FAILED);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut stdout = io::stdout();
    match cli.command {
        Command::Session(args) => {
            run_session(args)?;
            Ok(EXIT_OK)
        }
        Command::Analyze(args) => run_analyze(args),
        Command::Views => {
            let color = stdout.is_terminal();
            write_views(&mut stdout, color)?;
            Ok(EXIT_OK)
        }
        Command::Profiles => {
            write_profiles(&mut stdout, &ProfileRegistry::default())?;
            Ok(EXIT_OK)
        }
    }
}

/// Environment configuration with command-line overrides applied.
fn resolve_config(profile: Option<&str>, model: Option<&str>) -> Result<AnalyzerConfig> {
    let mut config = AnalyzerConfig::from_env()?;
    if profile.is_some() {
        config = config.with_profile(profile)?;
    }
    if let Some(model) = model {
        config = config.with_model(model);
    }
    if let Some(reason) = config.fallback_reason.as_deref() {
        eprintln!("{reason}");
    }
    Ok(config)
}

fn new_session(events: Option<&Path>) -> AnalysisSession {
    let host: Arc<dyn CredentialHost> = Arc::new(SessionKeyHost::from_env(TerminalKeySelector));
    let session = AnalysisSession::new(CredentialGate::new(Some(host)));
    match events {
        Some(path) => {
            let writer = EventWriter::new(path, session.id().to_string());
            session.with_events(writer)
        }
        None => session,
    }
}

fn run_session(args: SessionArgs) -> Result<()> {
    let config = resolve_config(args.profile.as_deref(), args.model.as_deref())?;
    let session = new_session(args.events.as_deref());
    let mut shell = SessionShell::new(session, config)?.with_color(io::stdout().is_terminal());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    shell.start(&mut stdout)?;

    loop {
        print!("> ");
        stdout.flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        if shell.handle(input, &mut stdout)? == ShellFlow::Quit {
            break;
        }
    }
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<i32> {
    let config = resolve_config(args.profile.as_deref(), args.model.as_deref())?;
    let mut session = new_session(args.events.as_deref());
    let analyzer = build_analyzer(&config, session.gate().host())?;

    if !session.verify_credentials() {
        eprintln!("{GATE_NOTICE}");
        session.connect();
    }
    analyze_once(
        &mut session,
        analyzer.as_ref(),
        &args.image,
        args.out.as_deref(),
        &mut io::stdout(),
    )
}

/// One-shot analysis; returns the process exit code.
fn analyze_once(
    session: &mut AnalysisSession,
    analyzer: &dyn ImageAnalyzer,
    image_path: &Path,
    out_path: Option<&Path>,
    out: &mut impl Write,
) -> Result<i32> {
    let image = read_image_file(image_path)?;
    if let Err(rejection) = UploadPolicy::default().check(&image) {
        bail!("{}: {rejection}", image_path.display());
    }
    match session.select_image(image) {
        Ok(()) => {}
        Err(SessionError::CredentialUnavailable) => {
            writeln!(out, "{}", SessionError::CredentialUnavailable)?;
            return Ok(EXIT_UNAUTHORIZED);
        }
        Err(err) => bail!(err),
    }

    let outcome = match session.run_analysis(analyzer) {
        Ok(outcome) => outcome,
        Err(SessionError::CredentialUnavailable) => {
            writeln!(out, "{}", SessionError::CredentialUnavailable)?;
            return Ok(EXIT_UNAUTHORIZED);
        }
        Err(err) => bail!(err),
    };
    write_outcome(session, &outcome, out)?;

    match outcome {
        AnalysisOutcome::Completed => {
            if let Some(result) = session.result() {
                let written = save_result(result, out_path)?;
                writeln!(out, "Saved {}", written.display())?;
            }
            Ok(EXIT_OK)
        }
        AnalysisOutcome::AuthorizationDenied => Ok(EXIT_UNAUTHORIZED),
        AnalysisOutcome::Failed(_) | AnalysisOutcome::Stale => Ok(EXIT_FAILED),
    }
}

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use dermascan_contracts::commands::{parse_intent, SESSION_HELP_COMMANDS};
use dermascan_contracts::imaging::SourceImage;
use dermascan_engine::{
    build_analyzer, read_image_file, AnalysisOutcome, AnalysisSession, AnalyzerConfig,
    CredentialHost, ImageAnalyzer, UploadPolicy,
};
use tracing::debug;

use crate::terminal::{save_result, write_views, GATE_NOTICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFlow {
    Continue,
    Quit,
}

/// Line-oriented front end over one [`AnalysisSession`].
pub struct SessionShell {
    session: AnalysisSession,
    config: AnalyzerConfig,
    analyzer: Box<dyn ImageAnalyzer>,
    host: Option<Arc<dyn CredentialHost>>,
    policy: UploadPolicy,
    color: bool,
}

impl SessionShell {
    pub fn new(session: AnalysisSession, config: AnalyzerConfig) -> Result<Self> {
        let host = session.gate().host();
        let analyzer = build_analyzer(&config, host.clone())?;
        Ok(Self {
            session,
            config,
            analyzer,
            host,
            policy: UploadPolicy::default(),
            color: false,
        })
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Startup check; prints the gate notice when no key is selected.
    pub fn start(&mut self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "DermaScan session started. Type /help for commands.")?;
        writeln!(
            out,
            "Profile {} using {}.",
            self.config.profile.name,
            self.analyzer_label()
        )?;
        if !self.session.verify_credentials() {
            writeln!(out, "{GATE_NOTICE}")?;
        }
        Ok(())
    }

    pub fn handle(&mut self, input: &str, out: &mut impl Write) -> Result<ShellFlow> {
        let intent = parse_intent(input);
        match intent.action.as_str() {
            "noop" => {}
            "help" => writeln!(out, "Commands: {}", SESSION_HELP_COMMANDS.join(" "))?,
            "quit" => return Ok(ShellFlow::Quit),
            "views" => write_views(out, self.color)?,
            "status" => writeln!(out, "{}", serde_json::to_string_pretty(&self.session.status())?)?,
            "connect" => self.connect(out)?,
            "select_image" => match intent.arg("path") {
                Some(uri) if uri.starts_with("data:") => self.paste_image(uri, out)?,
                Some(path) => self.open_image(Path::new(path), out)?,
                None => writeln!(out, "/open requires a path")?,
            },
            "start_analysis" => self.analyze(out)?,
            "reset" => match self.session.reset() {
                Ok(()) => writeln!(out, "Session reset. Upload a face photo to begin analysis.")?,
                Err(err) => writeln!(out, "Reset refused: {err}")?,
            },
            "save_result" => self.save(intent.arg("path").map(Path::new), out)?,
            "set_profile" => self.set_profile(intent.arg("profile"), out)?,
            "set_model" => match intent.arg("model") {
                Some(model) => {
                    self.config = self.config.clone().with_model(model);
                    self.rebuild_analyzer()?;
                    writeln!(out, "Model set to {}", self.analyzer_label())?;
                }
                None => writeln!(out, "Model: {}", self.analyzer_label())?,
            },
            "unknown" => writeln!(
                out,
                "Unknown command /{}. Type /help for commands.",
                intent.arg("command").unwrap_or_default()
            )?,
            other => debug!("unhandled action {other}"),
        }
        Ok(ShellFlow::Continue)
    }

    fn connect(&mut self, out: &mut impl Write) -> Result<()> {
        if self.session.connect() {
            writeln!(out, "API key selected.")?;
        } else {
            writeln!(out, "No API key selected.")?;
        }
        Ok(())
    }

    fn open_image(&mut self, path: &Path, out: &mut impl Write) -> Result<()> {
        match read_image_file(path) {
            Ok(image) => self.select(image, out),
            Err(err) => {
                writeln!(out, "Could not open image: {err:#}")?;
                Ok(())
            }
        }
    }

    /// Accepts a `data:` URL pasted in place of a path.
    fn paste_image(&mut self, uri: &str, out: &mut impl Write) -> Result<()> {
        match SourceImage::from_data_uri(uri) {
            Ok(image) => self.select(image.with_label("pasted image"), out),
            Err(err) => {
                writeln!(out, "Could not read pasted image: {err:#}")?;
                Ok(())
            }
        }
    }

    fn select(&mut self, image: SourceImage, out: &mut impl Write) -> Result<()> {
        if let Err(rejection) = self.policy.check(&image) {
            writeln!(out, "Image rejected: {rejection}")?;
            return Ok(());
        }
        let label = image.label().unwrap_or("image").to_string();
        match self.session.select_image(image) {
            Ok(()) => writeln!(out, "Ready for analysis: {label}")?,
            Err(err) => writeln!(out, "Cannot select image: {err}")?,
        }
        Ok(())
    }

    fn analyze(&mut self, out: &mut impl Write) -> Result<()> {
        let label = self
            .session
            .source_image()
            .and_then(|image| image.label())
            .unwrap_or("image");
        writeln!(
            out,
            "Analyzing dermal layers of {label} with {}...",
            self.analyzer_label()
        )?;
        out.flush()?;
        match self.session.run_analysis(self.analyzer.as_ref()) {
            Ok(outcome) => write_outcome(&self.session, &outcome, out)?,
            Err(err) => writeln!(out, "Analysis refused: {err}")?,
        }
        if !self.session.credentials_available() {
            writeln!(out, "{GATE_NOTICE}")?;
        }
        Ok(())
    }

    fn save(&self, path: Option<&Path>, out: &mut impl Write) -> Result<()> {
        let Some(result) = self.session.result() else {
            writeln!(out, "No analysis result to save.")?;
            return Ok(());
        };
        match save_result(result, path) {
            Ok(written) => writeln!(out, "Saved {}", written.display())?,
            Err(err) => writeln!(out, "Save failed: {err:#}")?,
        }
        Ok(())
    }

    fn set_profile(&mut self, name: Option<&str>, out: &mut impl Write) -> Result<()> {
        let Some(name) = name else {
            writeln!(out, "Profile: {}", self.config.profile.name)?;
            return Ok(());
        };
        let config = self.config.clone().with_profile(Some(name))?;
        if let Some(reason) = config.fallback_reason.as_deref() {
            writeln!(out, "{reason}")?;
        }
        self.config = config;
        self.rebuild_analyzer()?;
        writeln!(out, "Profile set to {}", self.config.profile.name)?;
        Ok(())
    }

    fn rebuild_analyzer(&mut self) -> Result<()> {
        self.analyzer = build_analyzer(&self.config, self.host.clone())?;
        Ok(())
    }

    fn analyzer_label(&self) -> String {
        format!("{} ({})", self.config.profile.model, self.analyzer.name())
    }
}

pub fn write_outcome(
    session: &AnalysisSession,
    outcome: &AnalysisOutcome,
    out: &mut impl Write,
) -> Result<()> {
    match outcome {
        AnalysisOutcome::Completed => {
            let bytes = session
                .result()
                .map(|result| result.image.decoded_len())
                .unwrap_or_default();
            writeln!(out, "Clinical analysis report ready ({bytes} bytes). Use /save to download.")?;
        }
        AnalysisOutcome::AuthorizationDenied => {
            let notice = session.auth_notice().unwrap_or(GATE_NOTICE);
            writeln!(out, "{notice}")?;
        }
        AnalysisOutcome::Failed(message) => {
            let message = session.last_error().unwrap_or(message);
            writeln!(out, "Analysis failed: {message}")?;
        }
        AnalysisOutcome::Stale => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use anyhow::Result;
    use dermascan_contracts::session::AnalysisPhase;
    use dermascan_engine::{AnalysisSession, AnalyzerConfig, CredentialGate, CredentialHost};

    use super::{SessionShell, ShellFlow};

    struct FixedHost {
        has_key: AtomicBool,
    }

    impl CredentialHost for FixedHost {
        fn has_selected_api_key(&self) -> Result<bool> {
            Ok(self.has_key.load(Ordering::SeqCst))
        }

        fn open_select_key(&self) -> Result<()> {
            self.has_key.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn api_key(&self) -> Option<String> {
            Some("test-key".to_string())
        }
    }

    fn dryrun_shell(has_key: bool) -> Result<SessionShell> {
        let host: Arc<dyn CredentialHost> = Arc::new(FixedHost {
            has_key: AtomicBool::new(has_key),
        });
        let session = AnalysisSession::new(CredentialGate::new(Some(host)));
        let config = AnalyzerConfig::from_lookup(|_| None)?.with_model("dryrun");
        SessionShell::new(session, config)
    }

    fn run(shell: &mut SessionShell, input: &str) -> Result<String> {
        let mut out = Vec::new();
        shell.handle(input, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn write_png(path: &std::path::Path) -> Result<()> {
        let pixel = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 150, 120]));
        pixel.save(path)?;
        Ok(())
    }

    #[test]
    fn gated_session_asks_for_a_key_first() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("face.png");
        write_png(&photo)?;
        let mut shell = dryrun_shell(false)?;

        let mut out = Vec::new();
        shell.start(&mut out)?;
        assert!(String::from_utf8(out)?.contains("/connect"));

        let refused = run(&mut shell, &format!("/open {}", photo.display()))?;
        assert!(refused.starts_with("Cannot select image"));
        let gated = run(&mut shell, "/analyze")?;
        assert!(gated.contains("Analysis refused: no API key is selected"));
        assert!(gated.contains("/connect"));

        assert_eq!(run(&mut shell, "/connect")?, "API key selected.\n");
        let opened = run(&mut shell, &photo.display().to_string())?;
        assert!(opened.starts_with("Ready for analysis"));
        Ok(())
    }

    #[test]
    fn open_analyze_save_round() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let photo = temp.path().join("face.png");
        write_png(&photo)?;
        let mut shell = dryrun_shell(true)?;
        shell.start(&mut Vec::new())?;

        run(&mut shell, &format!("/open {}", photo.display()))?;
        let analyzed = run(&mut shell, "/analyze")?;
        assert!(analyzed.contains("Clinical analysis report ready"));
        assert_eq!(shell.session().phase(), AnalysisPhase::Complete);

        let target = temp.path().join("report.png");
        let saved = run(&mut shell, &format!("/save {}", target.display()))?;
        assert!(saved.starts_with("Saved"));
        let written = image::open(&target)?;
        assert!(written.width() > 0);

        run(&mut shell, "/reset")?;
        assert_eq!(shell.session().phase(), AnalysisPhase::Idle);
        assert!(shell.session().source_image().is_none());
        Ok(())
    }

    #[test]
    fn non_image_files_are_rejected_before_the_session() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let notes = temp.path().join("notes.txt");
        fs::write(&notes, "not a photo")?;
        let mut shell = dryrun_shell(true)?;
        shell.start(&mut Vec::new())?;

        let output = run(&mut shell, &format!("/open {}", notes.display()))?;

        assert!(output.starts_with("Image rejected"));
        assert!(shell.session().source_image().is_none());
        Ok(())
    }

    #[test]
    fn pasted_data_url_is_selected() -> Result<()> {
        let mut shell = dryrun_shell(true)?;
        shell.start(&mut Vec::new())?;

        let output = run(&mut shell, "data:image/png;base64,iVBORw0KGgo=")?;
        assert_eq!(output, "Ready for analysis: pasted image\n");
        assert_eq!(
            shell.session().source_image().map(|image| image.mime_type()),
            Some("image/png")
        );

        let broken = run(&mut shell, "data:image/png,raw")?;
        assert!(broken.starts_with("Could not read pasted image"));
        Ok(())
    }

    #[test]
    fn analyze_without_image_is_refused() -> Result<()> {
        let mut shell = dryrun_shell(true)?;
        shell.start(&mut Vec::new())?;
        let output = run(&mut shell, "/analyze")?;
        assert!(output.contains("Analysis refused: no image selected"));
        assert_eq!(shell.session().phase(), AnalysisPhase::Idle);
        Ok(())
    }

    #[test]
    fn unknown_profile_falls_back_with_reason() -> Result<()> {
        let mut shell = dryrun_shell(true)?;
        let output = run(&mut shell, "/profile sepia")?;
        assert!(output.contains("Requested profile 'sepia' unknown; using default."));
        assert!(output.contains("Profile set to visia-grid"));

        let output = run(&mut shell, "/profile compact-grid")?;
        assert_eq!(output, "Profile set to compact-grid\n");
        let model = run(&mut shell, "/model")?;
        assert_eq!(model, "Model: dryrun (dryrun)\n");
        Ok(())
    }

    #[test]
    fn environment_model_is_kept_across_profile_switch() -> Result<()> {
        let host: Arc<dyn CredentialHost> = Arc::new(FixedHost {
            has_key: AtomicBool::new(true),
        });
        let session = AnalysisSession::new(CredentialGate::new(Some(host)));
        let config = AnalyzerConfig::from_lookup(|key| {
            (key == "DERMASCAN_MODEL").then(|| "dryrun".to_string())
        })?;
        let mut shell = SessionShell::new(session, config)?;

        assert_eq!(run(&mut shell, "/profile compact-grid")?, "Profile set to compact-grid\n");
        assert_eq!(run(&mut shell, "/model")?, "Model: dryrun (dryrun)\n");
        Ok(())
    }

    #[test]
    fn quit_and_unknown_commands() -> Result<()> {
        let mut shell = dryrun_shell(true)?;
        assert_eq!(shell.handle("/quit", &mut Vec::new())?, ShellFlow::Quit);
        assert_eq!(shell.handle("/exit", &mut Vec::new())?, ShellFlow::Quit);
        let output = run(&mut shell, "/zoom 2")?;
        assert_eq!(output, "Unknown command /zoom. Type /help for commands.\n");
        Ok(())
    }
}

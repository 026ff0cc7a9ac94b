use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dermascan_contracts::imaging::AnalysisResult;
use dermascan_contracts::profiles::ProfileRegistry;
use dermascan_contracts::views::{grid_cell, VIEW_DEFINITIONS};
use dermascan_engine::KeySelector;

pub const DEFAULT_DOWNLOAD_NAME: &str = "dermascan-analysis.png";

pub const GATE_NOTICE: &str = "DermaScan uses the Gemini 3 Pro Image model, which requires a paid \
API key from a Google Cloud project with billing enabled \
(https://ai.google.dev/gemini-api/docs/billing). Use /connect to select one.";

/// Reads a pasted API key from stdin.
pub struct TerminalKeySelector;

impl KeySelector for TerminalKeySelector {
    fn select_key(&self) -> Result<Option<String>> {
        let mut stderr = io::stderr();
        write!(stderr, "Paste a Gemini API key (blank to cancel): ")?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .context("failed reading API key")?;
        let key = line.trim();
        Ok((!key.is_empty()).then(|| key.to_string()))
    }
}

/// Grid legend; `color` prefixes each row with a swatch in the view accent.
pub fn write_views(out: &mut impl Write, color: bool) -> io::Result<()> {
    for (index, view) in VIEW_DEFINITIONS.iter().enumerate() {
        let (row, col) = grid_cell(index);
        if color {
            write!(out, "\x1b[48;5;{}m  \x1b[0m ", view.accent.ansi())?;
        }
        writeln!(
            out,
            "[{}:{}] {:<10} {:<14} {}",
            row + 1,
            col + 1,
            view.id,
            view.title,
            view.description
        )?;
    }
    Ok(())
}

pub fn write_profiles(out: &mut impl Write, registry: &ProfileRegistry) -> io::Result<()> {
    let default_name = registry.default_profile().map(|profile| profile.name.clone());
    for profile in registry.list() {
        let marker = if default_name.as_deref() == Some(profile.name.as_str()) {
            "*"
        } else {
            " "
        };
        writeln!(
            out,
            "{marker} {:<14} model={} aspect={} size={}",
            profile.name,
            profile.model,
            profile.aspect_ratio.as_deref().unwrap_or("-"),
            profile.image_size.as_deref().unwrap_or("-"),
        )?;
    }
    Ok(())
}

/// Decodes the result image to `path`, or to the default download name.
pub fn save_result(result: &AnalysisResult, path: Option<&Path>) -> Result<PathBuf> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_NAME));
    let bytes = result
        .image
        .decode()
        .context("analysis result is not valid base64")?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    fs::write(&path, bytes).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use chrono::Utc;
    use dermascan_contracts::imaging::{AnalysisResult, DataUri};
    use dermascan_contracts::profiles::ProfileRegistry;

    use super::{save_result, write_profiles, write_views};

    #[test]
    fn views_are_listed_in_grid_order() -> Result<()> {
        let mut out = Vec::new();
        write_views(&mut out, false)?;
        let text = String::from_utf8(out)?;
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("[1:1] brown"));
        assert!(lines[1].starts_with("[1:2] red"));
        assert!(lines[5].starts_with("[3:2] pores"));
        assert!(!text.contains('\x1b'));
        Ok(())
    }

    #[test]
    fn colored_legend_uses_view_accents() -> Result<()> {
        let mut out = Vec::new();
        write_views(&mut out, true)?;
        let text = String::from_utf8(out)?;
        let lines = text.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("\x1b[48;5;130m  \x1b[0m [1:1] brown"));
        assert!(lines[3].starts_with("\x1b[48;5;93m  \x1b[0m [2:2] wood"));
        Ok(())
    }

    #[test]
    fn default_profile_is_marked() -> Result<()> {
        let mut out = Vec::new();
        write_profiles(&mut out, &ProfileRegistry::default())?;
        let text = String::from_utf8(out)?;
        assert!(text.lines().any(|line| line.starts_with("* visia-grid")));
        assert!(text.lines().any(|line| line.starts_with("  compact-grid")));
        Ok(())
    }

    #[test]
    fn save_result_writes_decoded_bytes() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let result = AnalysisResult {
            image: DataUri::from_bytes("image/png", b"\x89PNG grid"),
            created_at: Utc::now(),
        };
        let target = temp.path().join("reports").join("anna.png");

        let written = save_result(&result, Some(&target))?;

        assert_eq!(written, target);
        assert_eq!(fs::read(&target)?, b"\x89PNG grid");
        Ok(())
    }
}

//! install and uninstall commands

use std::io::Write;

use anyhow::bail;

use crate::cli::channel::open;
use crate::cli::prompt::Prompt;
use crate::cli::{App, InstallArgs};
use crate::install::{InstallSource, UninstallOutcome, installer_for};
use crate::version::model::{BinaryVersion, GemfileVersion, VersionRecord};

/// Recorded versions installable from `source`, oldest first
fn installable(app: &App, source: InstallSource) -> anyhow::Result<Vec<(String, String)>> {
    fn versions<V: VersionRecord>(app: &App) -> anyhow::Result<Vec<(String, String)>> {
        Ok(open::<V>(app)?
            .all()
            .into_iter()
            .map(|record| (record.version().to_string(), record.display_name()))
            .collect())
    }

    match source {
        InstallSource::Gemfile => versions::<GemfileVersion>(app),
        InstallSource::Binary => versions::<BinaryVersion>(app),
    }
}

fn list(app: &App, source: InstallSource, out: &mut dyn Write) -> anyhow::Result<()> {
    let installed = app.resolver().installed_versions();
    let versions = installable(app, source)?;

    writeln!(out, "Installable versions (source: {source}):")?;
    if versions.is_empty() {
        writeln!(
            out,
            "  none recorded. Run `mnenv {} refresh` first",
            source.channel()
        )?;
        return Ok(());
    }

    for (version, display_name) in versions {
        match installed.iter().find(|i| i.version == version) {
            Some(i) => writeln!(out, "  [installed: {}] {display_name}", i.source)?,
            None => writeln!(out, "  [        ] {display_name}")?,
        }
    }
    Ok(())
}

fn choose(app: &App, prompt: &mut dyn Prompt) -> anyhow::Result<(String, InstallSource)> {
    let sources: Vec<String> = InstallSource::ALL.iter().map(|s| s.to_string()).collect();
    let source = InstallSource::ALL[prompt.select("Select a source:", &sources)?];

    let versions = installable(app, source)?;
    if versions.is_empty() {
        bail!(
            "No {source} versions recorded. Run `mnenv {} refresh` first",
            source.channel()
        );
    }

    let options: Vec<String> = versions.iter().rev().map(|(_, name)| name.clone()).collect();
    let index = prompt.select("Select a version:", &options)?;
    let (version, _) = versions[versions.len() - 1 - index].clone();
    Ok((version, source))
}

pub async fn install(
    app: &App,
    args: InstallArgs,
    out: &mut dyn Write,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<()> {
    let requested = args
        .source
        .as_deref()
        .map(|source| source.parse::<InstallSource>())
        .transpose()?;

    if args.list {
        return list(app, requested.unwrap_or(InstallSource::Gemfile), out);
    }

    let (version, source) = match args.version {
        Some(version) if !args.interactive => {
            (version, requested.unwrap_or(InstallSource::Gemfile))
        }
        _ => choose(app, prompt)?,
    };

    let reinstall = app.layout.version_dir(&version)?.is_dir();
    if reinstall {
        let recorded = app
            .resolver()
            .installed_versions()
            .into_iter()
            .find(|i| i.version == version)
            .map(|i| i.source)
            .unwrap_or_else(|| "unknown".to_string());

        if !args.force
            && !prompt.confirm(&format!(
                "Version {version} is already installed (source: {recorded}). Reinstall?"
            ))?
        {
            writeln!(out, "Installation cancelled.")?;
            return Ok(());
        }
    }

    writeln!(out, "Installing Metanorma {version} (source: {source})...")?;
    let installer = installer_for(
        source,
        &app.layout,
        &app.settings,
        app.clock.clone(),
        app.platform,
    );
    let report = crate::install::install(
        installer.as_ref(),
        &app.layout,
        &version,
        &app.shims(),
        reinstall,
    )
    .await?;

    writeln!(
        out,
        "Successfully installed Metanorma {version} (source: {source}, {} shims)",
        report.written.len()
    )?;
    Ok(())
}

pub fn uninstall(
    app: &App,
    version: &str,
    force: bool,
    out: &mut dyn Write,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<()> {
    if !app.layout.version_dir(version)?.is_dir() {
        writeln!(out, "Version {version} is not installed.")?;
        return Ok(());
    }

    if !force && !prompt.confirm(&format!("Uninstall Metanorma {version}? This cannot be undone."))? {
        writeln!(out, "Uninstall cancelled.")?;
        return Ok(());
    }

    match crate::install::uninstall(&app.layout, version, &app.shims())? {
        UninstallOutcome::Removed(_) => writeln!(out, "Uninstalled Metanorma {version}")?,
        UninstallOutcome::NotInstalled => writeln!(out, "Version {version} is not installed.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::LinePrompt;
    use crate::clock::{Clock, FixedClock};
    use crate::config::{INSTALL_SOURCE_FILE, Layout, Settings};
    use crate::install::InstallationError;
    use crate::platform::Platform;
    use crate::version::repository::Repository;
    use crate::version::types::Channel;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn app(root: &std::path::Path) -> App {
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()));
        App {
            layout: Layout::new(root.join("root")),
            settings: Settings::default(),
            clock,
            env: Arc::new(HashMap::<String, String>::new()),
            cwd: root.to_path_buf(),
            home: None,
            platform: Platform::Linux,
        }
    }

    fn args(version: Option<&str>, force: bool) -> InstallArgs {
        InstallArgs {
            version: version.map(str::to_string),
            source: None,
            interactive: false,
            force,
            list: false,
        }
    }

    fn install_fake(app: &App, version: &str, source: &str) {
        let dir = app.layout.version_dir(version).unwrap();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(INSTALL_SOURCE_FILE), format!("{source}\n")).unwrap();
    }

    #[tokio::test]
    async fn list_marks_installed_versions() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(temp_dir.path());
        let mut repository = Repository::<GemfileVersion>::open(
            &app.layout.channel_dir(Channel::Gemfile),
            app.clock.clone(),
        )
        .unwrap();
        repository
            .save_all([GemfileVersion::new("1.13.0"), GemfileVersion::new("1.14.4")])
            .unwrap();
        install_fake(&app, "1.14.4", "gemfile");

        let mut out = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());
        let mut list_args = args(None, false);
        list_args.list = true;
        install(&app, list_args, &mut out, &mut prompt).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Installable versions (source: gemfile):\n  [        ] v1.13.0\n  [installed: gemfile] v1.14.4\n"
        );
    }

    #[tokio::test]
    async fn declined_reinstall_keeps_existing_install() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(temp_dir.path());
        install_fake(&app, "1.14.4", "binary");

        let mut out = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new("n\n"), Vec::new());
        install(&app, args(Some("1.14.4"), false), &mut out, &mut prompt)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Installation cancelled.\n");
        assert!(app.layout.version_dir("1.14.4").unwrap().join(INSTALL_SOURCE_FILE).exists());
    }

    #[tokio::test]
    async fn interactive_install_without_records_asks_for_refresh() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(temp_dir.path());
        let mut interactive = args(None, false);
        interactive.interactive = true;

        let mut prompt = LinePrompt::new(Cursor::new("2\n"), Vec::new());
        let err = install(&app, interactive, &mut Vec::new(), &mut prompt)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "No binary versions recorded. Run `mnenv binary refresh` first"
        );
    }

    #[tokio::test]
    async fn install_of_unrecorded_gemfile_version_fails_before_creating_directory() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(temp_dir.path());
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());

        let result = install(&app, args(Some("9.9.9"), true), &mut Vec::new(), &mut prompt).await;

        assert!(result.is_err());
        assert!(!app.layout.version_dir("9.9.9").unwrap().exists());
    }

    #[tokio::test]
    async fn failed_forced_reinstall_keeps_existing_install() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(temp_dir.path());
        install_fake(&app, "1.14.4", "gemfile");
        std::fs::write(
            app.layout.version_dir("1.14.4").unwrap().join("Gemfile.lock"),
            "locked\n",
        )
        .unwrap();
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());

        let err = install(&app, args(Some("1.14.4"), true), &mut Vec::new(), &mut prompt)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallationError>(),
            Some(InstallationError::VersionNotFound { .. })
        ));
        let dir = app.layout.version_dir("1.14.4").unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.join(INSTALL_SOURCE_FILE)).unwrap(),
            "gemfile\n"
        );
        assert!(dir.join("Gemfile.lock").exists());
    }

    #[test]
    fn uninstall_rejects_parent_directory_version() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(temp_dir.path());
        install_fake(&app, "1.14.4", "gemfile");
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());

        let err = uninstall(&app, "..", true, &mut Vec::new(), &mut prompt).unwrap_err();

        assert!(err.to_string().starts_with("Invalid version '..'"));
        assert!(app.layout.version_dir("1.14.4").unwrap().is_dir());
    }

    #[test]
    fn uninstall_requires_confirmation() {
        let temp_dir = TempDir::new().unwrap();
        let app = app(temp_dir.path());
        install_fake(&app, "1.14.4", "gemfile");

        let mut out = Vec::new();
        let mut prompt = LinePrompt::new(Cursor::new("no\n"), Vec::new());
        uninstall(&app, "1.14.4", false, &mut out, &mut prompt).unwrap();
        assert!(app.layout.version_dir("1.14.4").unwrap().exists());

        let mut prompt = LinePrompt::new(Cursor::new("y\n"), Vec::new());
        uninstall(&app, "1.14.4", false, &mut out, &mut prompt).unwrap();

        assert!(!app.layout.version_dir("1.14.4").unwrap().exists());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Uninstall cancelled.\nUninstalled Metanorma 1.14.4\n"
        );
    }
}

//! Version selection: use, global, local, versions, which, rehash, shell-info

use std::io::Write;

use anyhow::{Context, bail};
use serde::Serialize;

use crate::cli::output::{OutputFormat, write_json};
use crate::cli::prompt::Prompt;
use crate::cli::{App, SelectArgs};
use crate::config::{LOCAL_SOURCE_FILE, LOCAL_VERSION_FILE};
use crate::resolution::InstalledVersion;
use crate::shell::ShellKind;

/// Version and source a selection command acts on
fn select(
    app: &App,
    args: SelectArgs,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<(String, String)> {
    let resolver = app.resolver();

    match args.version {
        Some(version) if !args.interactive => {
            let source = args.source.unwrap_or_else(|| resolver.default_source());
            Ok((version, source))
        }
        _ => {
            let installed = resolver.installed_versions();
            if installed.is_empty() {
                bail!("No versions installed. Run: mnenv install --list");
            }

            let options: Vec<String> = installed
                .iter()
                .map(|i| format!("{} ({})", i.version, i.source))
                .collect();
            let InstalledVersion { version, source } =
                installed[prompt.select("Select a version:", &options)?].clone();

            let source = args
                .source
                .or_else(|| (source != "unknown").then_some(source))
                .unwrap_or_else(|| resolver.default_source());
            Ok((version, source))
        }
    }
}

/// Print activation commands for the detected shell
pub fn use_version(
    app: &App,
    args: SelectArgs,
    out: &mut dyn Write,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<()> {
    let (version, source) = select(app, args, prompt)?;
    let shell = ShellKind::detect(app.env.as_ref(), app.platform)
        .adapter(app.layout.root(), app.home.as_deref());

    writeln!(out, "{}", shell.describe_activation(&version, Some(&source)))?;
    Ok(())
}

pub fn global(
    app: &App,
    args: SelectArgs,
    out: &mut dyn Write,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<()> {
    let (version, source) = select(app, args, prompt)?;
    app.resolver().set_global(&version, &source)?;

    writeln!(
        out,
        "Global Metanorma version set to {version} (source: {source})"
    )?;
    Ok(())
}

pub fn local(
    app: &App,
    args: SelectArgs,
    out: &mut dyn Write,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<()> {
    let (version, source) = select(app, args, prompt)?;
    app.resolver().set_local(&app.cwd, &version, &source)?;

    writeln!(
        out,
        "Local Metanorma version set to {version} (source: {source})"
    )?;
    writeln!(out, "Created {LOCAL_VERSION_FILE} and {LOCAL_SOURCE_FILE}")?;
    Ok(())
}

#[derive(Serialize)]
struct InstalledListing {
    current_version: Option<String>,
    current_source: String,
    installed: Vec<InstalledEntry>,
}

#[derive(Serialize)]
struct InstalledEntry {
    version: String,
    source: String,
    current: bool,
}

pub fn versions(app: &App, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let resolver = app.resolver();
    let installed = resolver.installed_versions();
    let current_version = resolver.resolve_version().ok().map(|r| r.value);
    let current_source = resolver.resolve_source().value;
    let is_current = |entry: &InstalledVersion| {
        current_version.as_deref() == Some(entry.version.as_str()) && entry.source == current_source
    };

    match format {
        OutputFormat::Json => {
            let entries = installed
                .iter()
                .map(|entry| InstalledEntry {
                    version: entry.version.clone(),
                    source: entry.source.clone(),
                    current: is_current(entry),
                })
                .collect();
            write_json(
                out,
                &InstalledListing {
                    current_version: current_version.clone(),
                    current_source: current_source.clone(),
                    installed: entries,
                },
            )
        }
        OutputFormat::Text => {
            if installed.is_empty() {
                writeln!(out, "No versions installed.")?;
                writeln!(out, "\nRun: mnenv install --list")?;
                return Ok(());
            }

            writeln!(out, "Installed Metanorma versions:")?;
            for entry in installed.iter().rev() {
                let marker = if is_current(entry) { "* " } else { "  " };
                writeln!(out, "  {marker}{} (source: {})", entry.version, entry.source)?;
            }
            writeln!(
                out,
                "\nCurrent version: {}",
                current_version.as_deref().unwrap_or("none")
            )?;
            writeln!(out, "Current source: {current_source}")?;
            Ok(())
        }
    }
}

/// Print the executable a shim named `name` would hand off to
pub fn which(app: &App, name: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let resolver = app.resolver();
    let version = resolver.resolve_version()?;
    let source = resolver.resolve_source();
    resolver.verify_installed(&version.value, &source.value)?;

    let path = resolver.executable_path(&version.value, &source.value, name, app.platform)?;
    if !path.is_file() {
        bail!(
            "{name} is not provided by version {} (source: {}). Run `mnenv versions` to see installed versions",
            version.value,
            source.value
        );
    }

    writeln!(out, "{}", path.display())?;
    Ok(())
}

pub fn rehash(app: &App, out: &mut dyn Write) -> anyhow::Result<()> {
    let shims = app.shims();
    let report = shims
        .regenerate_all()
        .context("Failed to regenerate shims")?;

    writeln!(
        out,
        "Wrote {} shims to {} ({} stale removed)",
        report.written.len(),
        shims.shims_dir().display(),
        report.removed.len()
    )?;
    Ok(())
}

pub fn shell_info(app: &App, out: &mut dyn Write) -> anyhow::Result<()> {
    let shell = ShellKind::detect(app.env.as_ref(), app.platform)
        .adapter(app.layout.root(), app.home.as_deref());
    let shims_dir = app.layout.shims_dir();

    writeln!(out, "Shell: {}", shell.name())?;
    writeln!(out, "Shims: {}", shims_dir.display())?;
    match shell.config_file() {
        Some(config) => writeln!(
            out,
            "Add {} to PATH in {}",
            shims_dir.display(),
            config.display()
        )?,
        None => writeln!(out, "Add {} to PATH in your user environment", shims_dir.display())?,
    }
    Ok(())
}

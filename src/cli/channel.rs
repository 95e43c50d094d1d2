//! Per-channel commands: list, refresh, revamp, update, info

use std::io::Write;

use anyhow::bail;
use serde::Serialize;

use crate::cli::output::{Listing, OutputFormat, write_json, write_listing, write_record};
use crate::cli::{App, ChannelAction, base_url};
use crate::version::extractor::GemfileExtractor;
use crate::version::fetcher::Fetcher;
use crate::version::materializer::{Materializer, RecordOnly};
use crate::version::model::{
    BinaryVersion, ChocolateyVersion, GemfileVersion, HomebrewVersion, SnapVersion, VersionRecord,
};
use crate::version::pipeline::{RefreshPipeline, RefreshReport};
use crate::version::registries::{
    ChocolateyFetcher, DockerHubFetcher, GitHubReleasesFetcher, GitHubTagsFetcher,
    SnapcraftFetcher, chocolatey, docker_hub, github_releases, github_tags, snapcraft,
};
use crate::version::repository::Repository;
use crate::version::types::Channel;

pub fn open<V: VersionRecord>(app: &App) -> anyhow::Result<Repository<V>> {
    Ok(Repository::open(
        &app.layout.channel_dir(V::CHANNEL),
        app.clock.clone(),
    )?)
}

pub async fn run(
    app: &App,
    channel: Channel,
    action: ChannelAction,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let registries = &app.settings.registries;
    match channel {
        Channel::Gemfile => {
            let fetcher = DockerHubFetcher::new(base_url(
                &registries.docker_hub,
                docker_hub::DEFAULT_BASE_URL,
            ));
            let extractor = GemfileExtractor::new(app.layout.channel_dir(Channel::Gemfile));
            execute(app, action, fetcher, extractor, out).await
        }
        Channel::Snap => {
            let fetcher =
                SnapcraftFetcher::new(base_url(&registries.snapcraft, snapcraft::DEFAULT_BASE_URL));
            execute(app, action, fetcher, RecordOnly, out).await
        }
        Channel::Homebrew => {
            let fetcher =
                GitHubTagsFetcher::new(base_url(&registries.github, github_tags::DEFAULT_BASE_URL));
            execute(app, action, fetcher, RecordOnly, out).await
        }
        Channel::Chocolatey => {
            let fetcher = ChocolateyFetcher::new(base_url(
                &registries.chocolatey,
                chocolatey::DEFAULT_BASE_URL,
            ));
            execute(app, action, fetcher, RecordOnly, out).await
        }
        Channel::Binary => {
            let fetcher = GitHubReleasesFetcher::new(base_url(
                &registries.github,
                github_releases::DEFAULT_BASE_URL,
            ));
            execute(app, action, fetcher, RecordOnly, out).await
        }
    }
}

async fn execute<F, M>(
    app: &App,
    action: ChannelAction,
    fetcher: F,
    materializer: M,
    out: &mut dyn Write,
) -> anyhow::Result<()>
where
    F: Fetcher,
    M: Materializer<F::Record>,
{
    let mut repository = open::<F::Record>(app)?;
    if let ChannelAction::List { format } = action {
        return write_listing(out, &repository, format);
    }

    let channel = fetcher.channel();
    let pipeline = RefreshPipeline::new(fetcher, materializer, app.clock.clone());
    match action {
        ChannelAction::List { .. } => Ok(()),
        ChannelAction::Refresh => {
            let report = pipeline.incremental(&mut repository).await?;
            write_report(out, &report, repository.count())
        }
        ChannelAction::Revamp => {
            let report = pipeline.revamp(&mut repository).await?;
            write_report(out, &report, repository.count())
        }
        ChannelAction::Update { version } => {
            let report = pipeline.replace_one(&mut repository, &version).await?;
            writeln!(
                out,
                "Updated {} {} ({} entries)",
                channel,
                version,
                report.recorded.len()
            )?;
            Ok(())
        }
    }
}

fn write_report(out: &mut dyn Write, report: &RefreshReport, total: usize) -> anyhow::Result<()> {
    writeln!(
        out,
        "Recorded {} {} versions ({} already present, {} total)",
        report.recorded.len(),
        report.channel,
        report.skipped,
        total
    )?;
    for identity in &report.recorded {
        writeln!(out, "  + {identity}")?;
    }
    Ok(())
}

pub fn info(
    app: &App,
    channel: Channel,
    version: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match channel {
        Channel::Gemfile => info_for::<GemfileVersion>(app, version, format, out),
        Channel::Snap => info_for::<SnapVersion>(app, version, format, out),
        Channel::Homebrew => info_for::<HomebrewVersion>(app, version, format, out),
        Channel::Chocolatey => info_for::<ChocolateyVersion>(app, version, format, out),
        Channel::Binary => info_for::<BinaryVersion>(app, version, format, out),
    }
}

/// Every entry recorded for `version` (several for composite-key channels)
fn info_for<V: VersionRecord>(
    app: &App,
    version: &str,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let repository = open::<V>(app)?;
    let version = version.strip_prefix('v').unwrap_or(version);
    let matches: Vec<&V> = repository
        .all()
        .into_iter()
        .filter(|record| record.version() == version)
        .collect();

    if matches.is_empty() {
        bail!(
            "{} version {} is not recorded. Run `mnenv {} refresh` or `mnenv {} list` to see recorded versions",
            V::CHANNEL,
            version,
            V::CHANNEL,
            V::CHANNEL
        );
    }

    for (index, record) in matches.into_iter().enumerate() {
        if index > 0 && format == OutputFormat::Text {
            writeln!(out)?;
        }
        write_record(out, record, format)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct AllListings<'a> {
    gemfile: Listing<'a, GemfileVersion>,
    snap: Listing<'a, SnapVersion>,
    homebrew: Listing<'a, HomebrewVersion>,
    chocolatey: Listing<'a, ChocolateyVersion>,
    binary: Listing<'a, BinaryVersion>,
}

pub fn list_all(app: &App, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<()> {
    let gemfile = open::<GemfileVersion>(app)?;
    let snap = open::<SnapVersion>(app)?;
    let homebrew = open::<HomebrewVersion>(app)?;
    let chocolatey = open::<ChocolateyVersion>(app)?;
    let binary = open::<BinaryVersion>(app)?;

    match format {
        OutputFormat::Json => write_json(
            out,
            &AllListings {
                gemfile: Listing::new(&gemfile),
                snap: Listing::new(&snap),
                homebrew: Listing::new(&homebrew),
                chocolatey: Listing::new(&chocolatey),
                binary: Listing::new(&binary),
            },
        ),
        OutputFormat::Text => {
            write_listing(out, &gemfile, format)?;
            writeln!(out)?;
            write_listing(out, &snap, format)?;
            writeln!(out)?;
            write_listing(out, &homebrew, format)?;
            writeln!(out)?;
            write_listing(out, &chocolatey, format)?;
            writeln!(out)?;
            write_listing(out, &binary, format)
        }
    }
}

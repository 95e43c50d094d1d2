//! Text and JSON rendering of listings

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use crate::version::model::VersionRecord;
use crate::version::repository::Repository;
use crate::version::types::Channel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// JSON listing of one channel
#[derive(Debug, Serialize)]
pub struct Listing<'a, V> {
    pub count: usize,
    pub latest: Option<&'a str>,
    pub channel: Channel,
    pub versions: Vec<ListedRecord<'a, V>>,
}

#[derive(Debug, Serialize)]
pub struct ListedRecord<'a, V> {
    #[serde(flatten)]
    pub record: &'a V,
    pub display_name: String,
}

impl<'a, V: VersionRecord> Listing<'a, V> {
    pub fn new(repository: &'a Repository<V>) -> Self {
        let versions = repository.all();
        Self {
            count: versions.len(),
            latest: versions.last().copied().map(|record| record.version()),
            channel: V::CHANNEL,
            versions: versions
                .into_iter()
                .map(|record| ListedRecord {
                    record,
                    display_name: record.display_name(),
                })
                .collect(),
        }
    }
}

pub fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// `Label versions (N):` followed by one line per record, oldest first
pub fn write_listing<V: VersionRecord>(
    out: &mut dyn Write,
    repository: &Repository<V>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(out, &Listing::new(repository)),
        OutputFormat::Text => {
            writeln!(out, "{} versions ({}):", V::CHANNEL.label(), repository.count())?;
            for record in repository.all() {
                match record.published_at() {
                    Some(published) => writeln!(
                        out,
                        "  {} ({})",
                        record.display_name(),
                        published.format("%Y-%m-%d")
                    )?,
                    None => writeln!(out, "  {}", record.display_name())?,
                }
            }
            Ok(())
        }
    }
}

/// Every field of a single record, one per line
pub fn write_record<V: VersionRecord>(
    out: &mut dyn Write,
    record: &V,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(
            out,
            &ListedRecord {
                record,
                display_name: record.display_name(),
            },
        ),
        OutputFormat::Text => {
            writeln!(out, "{} {}", V::CHANNEL.label(), record.display_name())?;
            writeln!(out, "  Version: {}", record.version())?;
            if let Some(published) = record.published_at() {
                writeln!(out, "  Published: {}", published.format("%Y-%m-%d %H:%M:%S UTC"))?;
            }
            if let Some(parsed) = record.parsed_at() {
                writeln!(out, "  Recorded: {}", parsed.format("%Y-%m-%d %H:%M:%S UTC"))?;
            }
            for (label, value) in record.details() {
                writeln!(out, "  {label}: {value}")?;
            }
            Ok(())
        }
    }
}

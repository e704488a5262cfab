use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compose::{ComposeOptions, GroupSummary, InvoiceComposer};
use crate::error::Result;
use crate::model::RecipientGroup;

/// How groups are split over output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One file per recipient, named after the recipient.
    #[default]
    PerRecipient,
    /// One file for the whole run, named after the run date.
    Combined,
}

/// File-name-safe form of a recipient name: spaces and apostrophes
/// dropped, path separators turned into dashes.
pub fn sanitize_recipient(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '\'' | '\u{2019}'))
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}

pub fn recipient_file_name(recipient: &str) -> String {
    format!("invoice_{}.pdf", sanitize_recipient(recipient))
}

pub fn combined_file_name(run_date: NaiveDate) -> String {
    format!("invoice_{}.pdf", run_date.format("%Y-%m-%d"))
}

/// A file written to disk and the groups it holds.
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub path: PathBuf,
    pub groups: Vec<GroupSummary>,
}

/// Render a single group as a document of its own.
pub fn render_group<W: Write>(writer: W, group: &RecipientGroup, options: &ComposeOptions) -> Result<(W, GroupSummary)> {
    let mut composer = InvoiceComposer::new(writer, options)?;
    let summary = composer.compose_group(group)?;
    Ok((composer.finish()?, summary))
}

/// Render several groups into one document, each in its own section.
pub fn render_combined<'g, W: Write>(
    writer: W,
    groups: impl IntoIterator<Item = &'g RecipientGroup>,
    options: &ComposeOptions,
) -> Result<(W, Vec<GroupSummary>)> {
    let mut composer = InvoiceComposer::new(writer, options)?;
    let mut summaries = Vec::new();
    for group in groups {
        summaries.push(composer.compose_group(group)?);
    }
    Ok((composer.finish()?, summaries))
}

/// Write the documents for `groups` into `dir`. Groups without billable
/// items produce nothing. A failure stops the run; files already
/// written stay on disk.
pub fn write_documents(
    groups: &[RecipientGroup],
    options: &ComposeOptions,
    mode: OutputMode,
    dir: &Path,
    run_date: NaiveDate,
) -> Result<Vec<WrittenDocument>> {
    let billable: Vec<&RecipientGroup> = groups
        .iter()
        .filter(|group| {
            let keep = group.has_billable_items(&options.rules);
            if !keep {
                log::warn!("{:?} has no billable items, skipped", group.recipient);
            }
            keep
        })
        .collect();

    match mode {
        OutputMode::PerRecipient => {
            let mut written = Vec::with_capacity(billable.len());
            let mut names = HashSet::new();
            for group in billable {
                let name = recipient_file_name(&group.recipient);
                if !names.insert(name.clone()) {
                    log::warn!("{} is produced by more than one recipient and will be overwritten", name);
                }
                let path = dir.join(name);
                let (writer, summary) = render_group(create(&path)?, group, options)?;
                finish_file(writer, &path, summary.pages)?;
                written.push(WrittenDocument {
                    path,
                    groups: vec![summary],
                });
            }
            Ok(written)
        }
        OutputMode::Combined => {
            if billable.is_empty() {
                log::warn!("no billable items, no document written");
                return Ok(Vec::new());
            }
            let path = dir.join(combined_file_name(run_date));
            let (writer, summaries) = render_combined(create(&path)?, billable, options)?;
            finish_file(writer, &path, summaries.iter().map(|s| s.pages).sum())?;
            Ok(vec![WrittenDocument {
                path,
                groups: summaries,
            }])
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

fn finish_file(mut writer: BufWriter<File>, path: &Path, pages: usize) -> Result<()> {
    writer.flush()?;
    log::info!("wrote {} ({} page(s))", path.display(), pages);
    Ok(())
}

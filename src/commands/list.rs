use crate::cli::ListFormat;
use crate::manifest::Section;
use crate::{ui, Config, Entry, Manifest};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct ListedEntry<'a> {
    #[serde(flatten)]
    entry: &'a Entry,
    #[serde(skip_serializing_if = "Option::is_none")]
    section: Option<&'a str>,
}

pub fn execute(
    config: &Config,
    file: Option<PathBuf>,
    format: ListFormat,
    section: Option<String>,
) -> Result<()> {
    let path = super::manifest_or_default(config, file)?;
    let outcome = Manifest::load(&path)?;

    // Listing is best effort; malformed lines are reported but do not stop it
    for error in &outcome.errors {
        ui::warn(format!("{}: {error}", path.display()));
    }

    let mut sections = outcome.manifest.sections();
    if let Some(wanted) = &section {
        sections.retain(|s| s.title.is_some_and(|title| title.eq_ignore_ascii_case(wanted)));
        if sections.is_empty() {
            anyhow::bail!("No section named '{}' in {}", wanted, path.display());
        }
    }

    match format {
        ListFormat::Json => print_json(&sections),
        ListFormat::Text => {
            print_text(&sections);
            Ok(())
        }
    }
}

fn print_json(sections: &[Section<'_>]) -> Result<()> {
    let listed: Vec<ListedEntry<'_>> = sections
        .iter()
        .flat_map(|section| {
            section.entries.iter().map(move |&entry| ListedEntry {
                entry,
                section: section.title,
            })
        })
        .collect();

    let json = serde_json::to_string_pretty(&listed).context("Failed to serialize entries")?;
    println!("{json}");
    Ok(())
}

fn print_text(sections: &[Section<'_>]) {
    if sections.is_empty() {
        ui::info("No requirements declared.");
        return;
    }

    for section in sections {
        ui::heading("Section", section.title.unwrap_or("(untitled)"));
        let width = section
            .entries
            .iter()
            .map(|entry| requirement_label(entry).len())
            .max()
            .unwrap_or(0);
        for entry in &section.entries {
            ui::detail(format!(
                "{:<width$}  {}",
                requirement_label(entry),
                entry.constraint()
            ));
        }
    }
}

fn requirement_label(entry: &Entry) -> String {
    if entry.extras.is_empty() {
        entry.name.clone()
    } else {
        format!("{}[{}]", entry.name, entry.extras.join(","))
    }
}

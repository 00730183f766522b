//! `depfinder references` command

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::cli::ReferencesArgs;
use crate::commands::display_path;
use depfinder::core::Reference;
use depfinder::util::diagnostic::suggestions;
use depfinder::util::fs::normalize_path;
use depfinder::util::shell::{Shell, Status};
use depfinder::util::GlobalContext;
use depfinder::{find_all_references, VersionIdentifier};

pub fn execute(args: ReferencesArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let root = ctx.resolve_path(&args.root);
    let opts = ctx.find_options(args.timeout.map(Duration::from_secs));
    let indexer = ctx.indexer();

    let stream = find_all_references(&root, &args.project, &args.type_name, &indexer, &opts)?;
    let base = normalize_path(&root);
    let range = VersionRange {
        min: args.min_version,
        max: args.max_version,
    };

    let span = shell.span(
        Status::Searching,
        format!("{} in projects depending on {}", args.type_name, args.project),
    );
    let spinner = shell.spinner(format!("Searching for {}...", args.type_name));
    let mut found = 0usize;
    let mut failed = 0usize;

    for item in stream {
        match item {
            Ok(reference) => {
                if !range.contains(reference.source_version.as_ref()) {
                    tracing::debug!(
                        "{} pins {} outside the requested range",
                        reference.consumer.name,
                        reference.source_project
                    );
                    continue;
                }
                found += 1;
                spinner.set_message(format!("Searching for {}... {} found", args.type_name, found));
                spinner.suspend(|| {
                    shell.json_record("reference", &reference);
                    shell.result(format_reference(&base, &reference));
                });
            }
            Err(e) if e.is_cancelled() => {
                spinner.finish();
                return Err(e.into());
            }
            Err(e) => {
                failed += 1;
                spinner.suspend(|| shell.item_error(&e));
            }
        }
    }
    spinner.finish();

    let mut summary = format!("{} reference(s) to {}", found, args.type_name);
    if failed > 0 {
        summary.push_str(&format!(", {} item(s) failed", failed));
    }
    span.finish_with_message(summary);
    if found == 0 && failed == 0 {
        shell.note(suggestions::QUALIFY_TYPE);
    }

    Ok(())
}

fn format_reference(base: &Path, r: &Reference) -> String {
    let mut line = format!(
        "{}: {}:{}:{} [{}]",
        r.consumer.name,
        display_path(base, &r.location.file),
        r.location.line,
        r.location.column,
        display_path(base, &r.solution_path)
    );
    if let Some(version) = &r.source_version {
        line.push_str(&format!(" ({} {})", r.source_project, version));
    }
    line
}

/// Inclusive bounds on the version a consumer pins.
struct VersionRange {
    min: Option<VersionIdentifier>,
    max: Option<VersionIdentifier>,
}

impl VersionRange {
    /// Without bounds everything matches; with bounds an unpinned consumer never does.
    fn contains(&self, version: Option<&VersionIdentifier>) -> bool {
        if self.min.is_none() && self.max.is_none() {
            return true;
        }
        let Some(version) = version else {
            return false;
        };
        self.min.as_ref().map_or(true, |min| version >= min)
            && self.max.as_ref().map_or(true, |max| version <= max)
    }
}

//! `depfinder solutions` command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::SolutionsArgs;
use crate::commands::display_path;
use depfinder::ops::{find_solution_with_project, find_solutions};
use depfinder::util::cancel::CancelToken;
use depfinder::util::fs::normalize_path;
use depfinder::util::shell::{Shell, Status};
use depfinder::util::GlobalContext;

pub fn execute(args: SolutionsArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let root = ctx.resolve_path(&args.root);
    let opts = ctx.scan_options(CancelToken::new());

    let items: Box<dyn Iterator<Item = depfinder::core::Result<PathBuf>>> = match &args.project {
        Some(name) => Box::new(find_solution_with_project(&root, name, &opts)?),
        None => Box::new(find_solutions(&root, &opts)?),
    };
    let base = normalize_path(&root);

    let spinner = shell.spinner(format!("Scanning {}...", root.display()));
    let mut found = 0usize;
    for item in items {
        match item {
            Ok(path) => {
                found += 1;
                spinner.suspend(|| {
                    shell.result(display_path(&base, &path));
                    shell.json_record("solution", &serde_json::json!({ "path": path }));
                });
            }
            Err(e) => spinner.suspend(|| shell.item_error(&e)),
        }
    }
    spinner.finish();

    let what = match &args.project {
        Some(name) => format!("{} solution(s) containing {}", found, name),
        None => format!("{} solution(s)", found),
    };
    shell.status(Status::Found, what);

    Ok(())
}

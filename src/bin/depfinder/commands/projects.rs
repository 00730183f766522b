//! `depfinder projects` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::ProjectsArgs;
use crate::commands::display_path;
use depfinder::ops::open_solution;
use depfinder::util::cancel::CancelToken;
use depfinder::util::shell::{Shell, Status};
use depfinder::util::GlobalContext;

pub fn execute(args: ProjectsArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let path = ctx.resolve_path(&args.solution);
    let solution = open_solution(&path, &ctx.open_options(CancelToken::new()))?;
    let base = path.parent().unwrap_or(ctx.cwd()).to_path_buf();

    for (entry, project) in solution.units() {
        let project = match project {
            Ok(project) => project,
            Err(e) => {
                shell.item_error(e);
                continue;
            }
        };

        shell.json_record("project", &project.details());
        shell.result(format!(
            "{} ({}, {}) {}",
            project.name(),
            project.output_kind(),
            project.target_framework().unwrap_or("unknown framework"),
            display_path(&base, project.absolute_path())
        ));

        if shell.is_verbose() {
            if entry.name != project.name() {
                shell.result(format!("    listed as {}", entry.name));
            }
            for reference in project.project_references() {
                shell.result(format!("    -> {}", reference.name));
            }
            for package in project.package_references() {
                shell.result(format!("    => {} {}", package.name, package.requirement));
            }
        }
    }

    shell.status(
        Status::Found,
        format!(
            "{} project(s), {} failed, in {}",
            solution.projects().count(),
            solution.failures().count(),
            path.display()
        ),
    );

    Ok(())
}

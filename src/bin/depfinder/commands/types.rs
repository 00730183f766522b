//! `depfinder types` command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::cli::TypesArgs;
use depfinder::core::SolutionFile;
use depfinder::ops::get_project_types;
use depfinder::util::fs::{has_extension, normalize_path};
use depfinder::util::shell::{Shell, Status};
use depfinder::util::GlobalContext;

pub fn execute(args: TypesArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let project = ctx.resolve_path(&args.project);
    let solution = match &args.solution {
        Some(path) => ctx.resolve_path(path),
        None => owning_solution(&project, &ctx.config().solution_extensions()).unwrap_or_default(),
    };

    let indexer = ctx.indexer();
    let types = get_project_types(&project, &solution, &indexer)?;

    for ty in &types {
        shell.json_record("type", ty);
        shell.result(format!("{:>9} {}", ty.kind, ty.full_name));
    }

    shell.status(
        Status::Found,
        format!("{} type(s) in {}", types.len(), project.display()),
    );

    Ok(())
}

/// The nearest solution in an ancestor directory that lists `project`.
fn owning_solution(project: &Path, extensions: &[String]) -> Option<PathBuf> {
    let target = normalize_path(project);

    for dir in target.ancestors().skip(1) {
        let Ok(read) = std::fs::read_dir(dir) else {
            continue;
        };
        let mut candidates: Vec<PathBuf> = read
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_extension(p, extensions))
            .collect();
        candidates.sort();

        for candidate in candidates {
            let Ok(solution) = SolutionFile::load(&candidate) else {
                continue;
            };
            if solution
                .entries()
                .iter()
                .any(|e| normalize_path(&e.path) == target)
            {
                tracing::debug!("{} belongs to {}", project.display(), candidate.display());
                return Some(candidate);
            }
        }
    }

    None
}

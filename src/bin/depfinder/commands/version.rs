//! `depfinder version` command

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::VersionArgs;
use depfinder::util::shell::Shell;
use depfinder::VersionIdentifier;

pub fn execute(args: VersionArgs, shell: &Arc<Shell>) -> Result<()> {
    let version: VersionIdentifier = args.version.parse()?;

    let Some(other) = &args.other else {
        shell.json_record(
            "version",
            &serde_json::json!({
                "input": args.version,
                "normalized": version,
                "numeric": version.numeric(),
                "label": version.label(),
                "prerelease": version.is_prerelease(),
            }),
        );
        shell.result(&version);
        if shell.is_verbose() {
            let numeric: Vec<String> = version.numeric().iter().map(u64::to_string).collect();
            shell.result(format!("  numeric: {}", numeric.join(".")));
            shell.result(format!("  label:   {}", version.label()));
        }
        return Ok(());
    };

    let other: VersionIdentifier = other.parse()?;
    let ordering = VersionIdentifier::compare(&version, &other);
    let (symbol, name) = match ordering {
        Ordering::Less => ("<", "less"),
        Ordering::Equal => ("==", "equal"),
        Ordering::Greater => (">", "greater"),
    };

    shell.json_record(
        "comparison",
        &serde_json::json!({ "left": version, "right": other, "ordering": name }),
    );
    shell.result(format!("{} {} {}", version, symbol, other));

    Ok(())
}

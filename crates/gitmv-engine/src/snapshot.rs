use gitmv_core::{CommitInfo, GitmvError, Narrator, Notice, Repository, Result, Snapshot};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::warn;

/// Capture the descriptive record for an export of `branches`.
///
/// `active` is the branch checked out at export time; when it was not
/// selected, the first selected branch stands in for it. A ref whose commit
/// info cannot be read is left out of the metadata with a warning instead
/// of failing the export.
pub fn build_snapshot(
    repo: &dyn Repository,
    narrator: &dyn Narrator,
    branches: &[String],
    active: &str,
    exported_at: OffsetDateTime,
) -> Result<Snapshot> {
    let tags = repo.all_tags()?;
    let current_branch = if branches.iter().any(|b| b == active) {
        active.to_string()
    } else {
        branches.first().cloned().unwrap_or_default()
    };

    let export_date = exported_at
        .format(&Rfc3339)
        .map_err(|e| GitmvError::archive(format!("format export date: {e}")))?;

    Ok(Snapshot {
        export_date,
        current_branch,
        branch_metadata: collect_info(repo, narrator, branches),
        tag_metadata: collect_info(repo, narrator, &tags),
        branches: branches.to_vec(),
        tags,
        repository_path: repo.workdir().display().to_string(),
    })
}

fn collect_info(
    repo: &dyn Repository,
    narrator: &dyn Narrator,
    refs: &[String],
) -> BTreeMap<String, CommitInfo> {
    let mut out = BTreeMap::new();
    for reference in refs {
        match repo.commit_info(reference) {
            Ok(info) => {
                out.insert(reference.clone(), info);
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, "commit info unavailable");
                narrator.notify(Notice::CommitInfoUnavailable {
                    reference: reference.clone(),
                });
            }
        }
    }
    out
}

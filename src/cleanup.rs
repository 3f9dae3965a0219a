use anyhow::{Context, Result};

use crate::providers::ado::project_wiql;
use crate::providers::AdoApi;

/// Delete every work item in `project`, one at a time. Returns how many
/// deletes were attempted; a failed delete is logged and skipped.
pub async fn run_cleanup(ado: &dyn AdoApi, project: &str) -> Result<usize> {
    let ids = ado
        .query_work_item_ids(&project_wiql(project))
        .await
        .with_context(|| format!("Failed to list work items of {project}"))?;
    tracing::info!(count = ids.len(), project, "Deleting work items");

    for id in &ids {
        match ado.delete_work_item(*id).await {
            Ok(()) => tracing::debug!(id, "Deleted work item"),
            Err(e) => tracing::warn!(id, error = %format!("{e:#}"), "Delete failed"),
        }
    }

    Ok(ids.len())
}

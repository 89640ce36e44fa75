//! Expected asset baseline repository.

use nmaptracker_models::baseline::ExpectedAssetBaseline;
use nmaptracker_models::error::Result;
use sqlx::SqliteExecutor;

pub async fn insert<'e>(exec: impl SqliteExecutor<'e>, baseline: &ExpectedAssetBaseline) -> Result<()> {
    sqlx::query(
        "INSERT INTO expected_asset_baselines (id, project_id, definition, kind, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&baseline.id)
    .bind(&baseline.project_id)
    .bind(&baseline.definition)
    .bind(&baseline.kind)
    .bind(&baseline.created_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn list_by_project<'e>(
    exec: impl SqliteExecutor<'e>,
    project_id: &str,
) -> Result<Vec<ExpectedAssetBaseline>> {
    Ok(sqlx::query_as::<_, ExpectedAssetBaseline>(
        "SELECT * FROM expected_asset_baselines WHERE project_id = ? ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(exec)
    .await?)
}

pub async fn delete<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM expected_asset_baselines WHERE id = ?").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
}

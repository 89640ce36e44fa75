//! Project repository.

use nmaptracker_models::error::Result;
use nmaptracker_models::project::Project;
use sqlx::SqliteExecutor;

pub async fn insert<'e>(exec: impl SqliteExecutor<'e>, project: &Project) -> Result<()> {
    sqlx::query("INSERT INTO projects (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.created_at)
        .bind(&project.updated_at)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn get_by_id<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<Option<Project>> {
    Ok(sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?").bind(id).fetch_optional(exec).await?)
}

pub async fn get_by_name<'e>(exec: impl SqliteExecutor<'e>, name: &str) -> Result<Option<Project>> {
    Ok(sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE name = ?").bind(name).fetch_optional(exec).await?)
}

pub async fn list<'e>(exec: impl SqliteExecutor<'e>) -> Result<Vec<Project>> {
    Ok(sqlx::query_as::<_, Project>("SELECT * FROM projects ORDER BY created_at ASC").fetch_all(exec).await?)
}

pub async fn update_name<'e>(exec: impl SqliteExecutor<'e>, id: &str, name: &str, updated_at: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE projects SET name = ?, updated_at = ? WHERE id = ?")
        .bind(name)
        .bind(updated_at)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
}

//! Project CRUD (spec.md §6: `projects: create, delete, list, get_by_id,
//! get_by_name, update`).

use chrono::Utc;
use nmaptracker_db::repo::projects;
use nmaptracker_models::error::{Result, TrackerError};
use nmaptracker_models::project::Project;
use sqlx::SqlitePool;

pub async fn create(pool: &SqlitePool, name: String) -> Result<Project> {
    let project = Project::new(name);
    projects::insert(pool, &project).await?;
    Ok(project)
}

pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Project> {
    projects::get_by_id(pool, id).await?.ok_or_else(|| TrackerError::NotFound(format!("project {id}")))
}

pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Project> {
    projects::get_by_name(pool, name).await?.ok_or_else(|| TrackerError::NotFound(format!("project named {name:?}")))
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Project>> {
    projects::list(pool).await
}

pub async fn update(pool: &SqlitePool, id: &str, name: &str) -> Result<Project> {
    let updated_at = Utc::now().to_rfc3339();
    if !projects::update_name(pool, id, name, &updated_at).await? {
        return Err(TrackerError::NotFound(format!("project {id}")));
    }
    get_by_id(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<()> {
    if !projects::delete(pool, id).await? {
        return Err(TrackerError::NotFound(format!("project {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmaptracker_db::pool::open_test;

    #[tokio::test]
    async fn test_project_crud_roundtrip() {
        let pool = open_test().await.unwrap();
        let project = create(&pool, "Acme".to_string()).await.unwrap();

        assert_eq!(get_by_id(&pool, &project.id).await.unwrap().name, "Acme");
        assert_eq!(get_by_name(&pool, "Acme").await.unwrap().id, project.id);
        assert_eq!(list(&pool).await.unwrap().len(), 1);

        let renamed = update(&pool, &project.id, "Acme Corp").await.unwrap();
        assert_eq!(renamed.name, "Acme Corp");

        delete(&pool, &project.id).await.unwrap();
        assert!(matches!(get_by_id(&pool, &project.id).await.unwrap_err(), TrackerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_project_is_not_found() {
        let pool = open_test().await.unwrap();
        assert!(matches!(delete(&pool, "does-not-exist").await.unwrap_err(), TrackerError::NotFound(_)));
    }
}

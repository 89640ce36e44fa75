//! Scope definition repository.

use nmaptracker_models::error::Result;
use nmaptracker_models::scope::ScopeDefinition;
use sqlx::SqliteExecutor;

pub async fn insert<'e>(exec: impl SqliteExecutor<'e>, scope: &ScopeDefinition) -> Result<()> {
    sqlx::query("INSERT INTO scope_definitions (id, project_id, definition, kind, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(&scope.id)
        .bind(&scope.project_id)
        .bind(&scope.definition)
        .bind(&scope.kind)
        .bind(&scope.created_at)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn list_by_project<'e>(exec: impl SqliteExecutor<'e>, project_id: &str) -> Result<Vec<ScopeDefinition>> {
    Ok(sqlx::query_as::<_, ScopeDefinition>(
        "SELECT * FROM scope_definitions WHERE project_id = ? ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(exec)
    .await?)
}

pub async fn delete<'e>(exec: impl SqliteExecutor<'e>, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM scope_definitions WHERE id = ?").bind(id).execute(exec).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_test;
    use crate::repo::projects;
    use nmaptracker_models::project::Project;
    use nmaptracker_models::scope::ScopeKind;

    #[tokio::test]
    async fn test_scope_crud() {
        let pool = open_test().await.unwrap();
        let project = Project::new("Acme".to_string());
        projects::insert(&pool, &project).await.unwrap();

        let rule = ScopeDefinition::new(project.id.clone(), "10.0.0.0/24".to_string(), ScopeKind::Include);
        insert(&pool, &rule).await.unwrap();

        let rules = list_by_project(&pool, &project.id).await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind, "include");

        assert!(delete(&pool, &rule.id).await.unwrap());
        assert!(list_by_project(&pool, &project.id).await.unwrap().is_empty());
    }
}

//! Projects

use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{row_exists, CascadeReport, Project, ProjectUpdate, Result, Store, StoreError};
use crate::core::identity::{EntityId, EntityPrefix};

/// Maximum project name length, in characters
pub const MAX_NAME_LEN: usize = 100;

/// Maximum project description length, in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;

const PROJECT_COLUMNS: &str = "id, name, description, category_id";

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
    })
}

fn validate(name: &str, description: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("project name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::Validation(format!(
            "project name is longer than {} characters",
            MAX_NAME_LEN
        )));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(StoreError::Validation(format!(
            "project description is longer than {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    Ok(())
}

impl Store {
    pub fn create_project(
        &mut self,
        name: &str,
        description: &str,
        category: &EntityId,
    ) -> Result<Project> {
        let name = name.trim();
        validate(name, description)?;
        if !row_exists(&self.conn, "project_categories", category)? {
            return Err(StoreError::Reference {
                entity: "project category",
                id: category.to_string(),
            });
        }

        let project = Project {
            id: EntityId::new(EntityPrefix::Prj),
            name: name.to_string(),
            description: description.to_string(),
            category: category.clone(),
        };
        self.conn
            .execute(
                "INSERT INTO projects (id, name, description, category_id) VALUES (?1, ?2, ?3, ?4)",
                params![project.id, project.name, project.description, project.category],
            )
            .map_err(StoreError::from_sqlite)?;
        info!(id = %project.id, name = %project.name, "created project");

        Ok(project)
    }

    pub fn get_project(&self, id: &EntityId) -> Result<Project> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
                params![id],
                project_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                entity: "project",
                id: id.to_string(),
            })
    }

    /// All projects, or only those filed directly under `category`
    pub fn list_projects(&self, category: Option<&EntityId>) -> Result<Vec<Project>> {
        let projects = match category {
            Some(category) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM projects WHERE category_id = ?1 ORDER BY name, id",
                    PROJECT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map(params![category], project_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM projects ORDER BY name, id",
                    PROJECT_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], project_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(projects)
    }

    pub fn update_project(&mut self, id: &EntityId, update: ProjectUpdate) -> Result<Project> {
        let mut project = self.get_project(id)?;
        if let Some(name) = update.name {
            project.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        if let Some(category) = update.category {
            if !row_exists(&self.conn, "project_categories", &category)? {
                return Err(StoreError::Reference {
                    entity: "project category",
                    id: category.to_string(),
                });
            }
            project.category = category;
        }
        validate(&project.name, &project.description)?;

        self.conn
            .execute(
                "UPDATE projects SET name = ?1, description = ?2, category_id = ?3 WHERE id = ?4",
                params![project.name, project.description, project.category, id],
            )
            .map_err(StoreError::from_sqlite)?;

        Ok(project)
    }

    /// Delete a project and its part associations and runs
    pub fn delete_project(&mut self, id: &EntityId) -> Result<CascadeReport> {
        let tx = self.conn.transaction()?;
        let (parts, runs): (i64, i64) = tx.query_row(
            r#"SELECT
                   (SELECT COUNT(*) FROM project_parts WHERE project_id = ?1),
                   (SELECT COUNT(*) FROM project_runs WHERE project_id = ?1)"#,
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if tx.execute("DELETE FROM projects WHERE id = ?1", params![id])? == 0 {
            return Err(StoreError::NotFound {
                entity: "project",
                id: id.to_string(),
            });
        }
        tx.commit()?;
        info!(id = %id, project_parts = parts, runs, "deleted project");

        Ok(CascadeReport {
            categories: 0,
            projects: 1,
            project_parts: parts as usize,
            runs: runs as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::NewProjectPart;

    fn store_with_category() -> (Store, EntityId) {
        let mut store = Store::open_in_memory().unwrap();
        let category = store.create_category("Assemblies", "", None).unwrap();
        (store, category.id)
    }

    #[test]
    fn test_create_and_get_project() {
        let (mut store, category) = store_with_category();
        let project = store
            .create_project("  Power supply  ", "12V bench supply", &category)
            .unwrap();

        assert_eq!(project.name, "Power supply");
        assert_eq!(project.to_string(), "Power supply");
        assert_eq!(store.get_project(&project.id).unwrap(), project);
    }

    #[test]
    fn test_project_requires_existing_category() {
        let mut store = Store::open_in_memory().unwrap();
        let ghost = EntityId::new(EntityPrefix::Cat);
        assert!(matches!(
            store.create_project("Widget", "", &ghost),
            Err(StoreError::Reference { .. })
        ));
    }

    #[test]
    fn test_field_limits() {
        let (mut store, category) = store_with_category();
        assert!(matches!(
            store.create_project("", "", &category),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.create_project(&"n".repeat(MAX_NAME_LEN + 1), "", &category),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.create_project("ok", &"d".repeat(MAX_DESCRIPTION_LEN + 1), &category),
            Err(StoreError::Validation(_))
        ));
        assert!(store
            .create_project(&"n".repeat(MAX_NAME_LEN), &"d".repeat(MAX_DESCRIPTION_LEN), &category)
            .is_ok());
    }

    #[test]
    fn test_update_project_moves_category() {
        let (mut store, category) = store_with_category();
        let other = store.create_category("Kits", "", None).unwrap();
        let project = store.create_project("Robot", "", &category).unwrap();

        let updated = store
            .update_project(
                &project.id,
                ProjectUpdate {
                    description: Some("line follower".into()),
                    category: Some(other.id.clone()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.category, other.id);
        assert_eq!(updated.description, "line follower");
        assert!(store.list_projects(Some(&category)).unwrap().is_empty());
        assert_eq!(store.list_projects(Some(&other.id)).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_project_cascades() {
        let (mut store, category) = store_with_category();
        let project = store.create_project("Lamp", "", &category).unwrap();
        let bulb = store.create_part("Bulb", "").unwrap();
        store
            .get_or_create_project_part(NewProjectPart::new(project.id.clone(), bulb.id.clone()))
            .unwrap();
        store.record_run(&project.id, 3).unwrap();

        let report = store.delete_project(&project.id).unwrap();
        assert_eq!(report.project_parts, 1);
        assert_eq!(report.runs, 1);

        let stats = store.statistics().unwrap();
        assert_eq!(stats.project_parts, 0);
        assert_eq!(stats.runs, 0);
        assert_eq!(stats.parts, 1);
        assert!(matches!(
            store.delete_project(&project.id),
            Err(StoreError::NotFound { .. })
        ));
    }
}

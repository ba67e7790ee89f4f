//! Project category tree
//!
//! Categories form a forest through a nullable parent pointer. Ancestor and
//! descendant walks are recursive CTEs over that pointer; cycles are refused
//! when a node is re-parented.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{
    row_exists, CascadeReport, CategoryNode, Project, ProjectCategory, Result, Store, StoreError,
};
use crate::core::identity::{EntityId, EntityPrefix};

const CATEGORY_COLUMNS: &str = "id, name, description, parent_id";

fn category_from_row(row: &Row) -> rusqlite::Result<ProjectCategory> {
    Ok(ProjectCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        parent: row.get(3)?,
    })
}

fn not_found(id: &EntityId) -> StoreError {
    StoreError::NotFound {
        entity: "project category",
        id: id.to_string(),
    }
}

/// IDs of every category strictly below `id`
fn descendant_ids(conn: &Connection, id: &EntityId) -> Result<Vec<EntityId>> {
    let mut stmt = conn.prepare(
        r#"WITH RECURSIVE subtree(id) AS (
               SELECT id FROM project_categories WHERE parent_id = ?1
               UNION ALL
               SELECT c.id FROM project_categories c JOIN subtree s ON c.parent_id = s.id
           )
           SELECT id FROM subtree"#,
    )?;
    let ids = stmt
        .query_map(params![id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<EntityId>>>()?;
    Ok(ids)
}

fn map_duplicate(err: rusqlite::Error, name: &str) -> StoreError {
    if StoreError::is_unique_violation(&err) {
        StoreError::Duplicate {
            entity: "project category",
            name: name.to_string(),
        }
    } else {
        StoreError::from_sqlite(err)
    }
}

impl Store {
    pub fn create_category(
        &mut self,
        name: &str,
        description: &str,
        parent: Option<&EntityId>,
    ) -> Result<ProjectCategory> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation(
                "category name must not be empty".into(),
            ));
        }
        if let Some(parent) = parent {
            if !row_exists(&self.conn, "project_categories", parent)? {
                return Err(StoreError::Reference {
                    entity: "project category",
                    id: parent.to_string(),
                });
            }
        }

        let category = ProjectCategory {
            id: EntityId::new(EntityPrefix::Cat),
            name: name.to_string(),
            description: description.to_string(),
            parent: parent.cloned(),
        };
        self.conn
            .execute(
                "INSERT INTO project_categories (id, name, description, parent_id) VALUES (?1, ?2, ?3, ?4)",
                params![category.id, category.name, category.description, category.parent],
            )
            .map_err(|e| map_duplicate(e, name))?;
        info!(id = %category.id, name = %category.name, "created project category");

        Ok(category)
    }

    pub fn get_category(&self, id: &EntityId) -> Result<ProjectCategory> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM project_categories WHERE id = ?1",
                    CATEGORY_COLUMNS
                ),
                params![id],
                category_from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(id))
    }

    pub fn list_categories(&self) -> Result<Vec<ProjectCategory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM project_categories ORDER BY name, id",
            CATEGORY_COLUMNS
        ))?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// Direct children of a category
    pub fn children(&self, id: &EntityId) -> Result<Vec<ProjectCategory>> {
        self.get_category(id)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM project_categories WHERE parent_id = ?1 ORDER BY name, id",
            CATEGORY_COLUMNS
        ))?;
        let children = stmt
            .query_map(params![id], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(children)
    }

    /// Projects filed directly under this category (child categories excluded)
    pub fn category_projects(&self, id: &EntityId) -> Result<Vec<Project>> {
        self.get_category(id)?;
        self.list_projects(Some(id))
    }

    /// Ancestors of a category from the root down to the category itself
    pub fn category_path(&self, id: &EntityId) -> Result<Vec<ProjectCategory>> {
        let mut stmt = self.conn.prepare(
            r#"WITH RECURSIVE ancestry(id, name, description, parent_id, depth) AS (
                   SELECT id, name, description, parent_id, 0
                   FROM project_categories WHERE id = ?1
                   UNION ALL
                   SELECT c.id, c.name, c.description, c.parent_id, a.depth + 1
                   FROM project_categories c JOIN ancestry a ON c.id = a.parent_id
               )
               SELECT id, name, description, parent_id FROM ancestry ORDER BY depth DESC"#,
        )?;
        let path = stmt
            .query_map(params![id], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if path.is_empty() {
            return Err(not_found(id));
        }
        Ok(path)
    }

    /// Slash-separated path string, e.g. `Electronics/Power/Regulators`
    pub fn category_pathstring(&self, id: &EntityId) -> Result<String> {
        Ok(self
            .category_path(id)?
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// Every category below this one, nearest first
    pub fn descendants(&self, id: &EntityId) -> Result<Vec<ProjectCategory>> {
        self.get_category(id)?;
        let mut stmt = self.conn.prepare(
            r#"WITH RECURSIVE subtree(id, depth) AS (
                   SELECT id, 1 FROM project_categories WHERE parent_id = ?1
                   UNION ALL
                   SELECT c.id, s.depth + 1
                   FROM project_categories c JOIN subtree s ON c.parent_id = s.id
               )
               SELECT c.id, c.name, c.description, c.parent_id
               FROM subtree s JOIN project_categories c ON c.id = s.id
               ORDER BY s.depth, c.name, c.id"#,
        )?;
        let categories = stmt
            .query_map(params![id], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// Whole forest in depth-first order, siblings sorted by name
    pub fn category_tree(&self) -> Result<Vec<CategoryNode>> {
        let categories = self.list_categories()?;

        let mut by_parent: HashMap<Option<EntityId>, Vec<ProjectCategory>> = HashMap::new();
        for category in categories {
            by_parent
                .entry(category.parent.clone())
                .or_default()
                .push(category);
        }

        let mut nodes = Vec::new();
        let mut stack: Vec<(usize, ProjectCategory)> = by_parent
            .remove(&None)
            .unwrap_or_default()
            .into_iter()
            .rev()
            .map(|c| (0, c))
            .collect();

        while let Some((depth, category)) = stack.pop() {
            if let Some(children) = by_parent.remove(&Some(category.id.clone())) {
                stack.extend(children.into_iter().rev().map(|c| (depth + 1, c)));
            }
            nodes.push(CategoryNode { depth, category });
        }

        Ok(nodes)
    }

    /// Re-parent a category. `None` makes it a root.
    pub fn move_category(
        &mut self,
        id: &EntityId,
        new_parent: Option<&EntityId>,
    ) -> Result<ProjectCategory> {
        let tx = self.conn.transaction()?;

        if !row_exists(&tx, "project_categories", id)? {
            return Err(not_found(id));
        }
        if let Some(parent) = new_parent {
            if !row_exists(&tx, "project_categories", parent)? {
                return Err(StoreError::Reference {
                    entity: "project category",
                    id: parent.to_string(),
                });
            }
            if parent == id || descendant_ids(&tx, id)?.contains(parent) {
                return Err(StoreError::Cycle {
                    category: id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let name: String = tx.query_row(
            "SELECT name FROM project_categories WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        tx.execute(
            "UPDATE project_categories SET parent_id = ?1 WHERE id = ?2",
            params![new_parent, id],
        )
        .map_err(|e| map_duplicate(e, &name))?;
        tx.commit()?;
        debug!(id = %id, parent = ?new_parent.map(|p| p.to_string()), "moved project category");

        self.get_category(id)
    }

    /// Rename or re-describe a category
    pub fn update_category(
        &mut self,
        id: &EntityId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<ProjectCategory> {
        let mut category = self.get_category(id)?;
        if let Some(name) = name {
            let name = name.trim();
            if name.is_empty() {
                return Err(StoreError::Validation(
                    "category name must not be empty".into(),
                ));
            }
            category.name = name.to_string();
        }
        if let Some(description) = description {
            category.description = description.to_string();
        }

        self.conn
            .execute(
                "UPDATE project_categories SET name = ?1, description = ?2 WHERE id = ?3",
                params![category.name, category.description, id],
            )
            .map_err(|e| map_duplicate(e, &category.name))?;

        Ok(category)
    }

    /// Delete a category together with its subtree, their projects, and
    /// those projects' part associations and runs
    pub fn delete_category(&mut self, id: &EntityId) -> Result<CascadeReport> {
        let tx = self.conn.transaction()?;
        if !row_exists(&tx, "project_categories", id)? {
            return Err(not_found(id));
        }

        let mut subtree = descendant_ids(&tx, id)?;
        subtree.push(id.clone());

        let mut report = CascadeReport {
            categories: subtree.len(),
            ..Default::default()
        };
        for category in &subtree {
            let (projects, parts, runs): (i64, i64, i64) = tx.query_row(
                r#"SELECT
                       (SELECT COUNT(*) FROM projects WHERE category_id = ?1),
                       (SELECT COUNT(*) FROM project_parts pp
                          JOIN projects p ON pp.project_id = p.id WHERE p.category_id = ?1),
                       (SELECT COUNT(*) FROM project_runs r
                          JOIN projects p ON r.project_id = p.id WHERE p.category_id = ?1)"#,
                params![category],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            report.projects += projects as usize;
            report.project_parts += parts as usize;
            report.runs += runs as usize;
        }

        tx.execute(
            "DELETE FROM project_categories WHERE id = ?1",
            params![id],
        )?;
        tx.commit()?;
        info!(
            id = %id,
            categories = report.categories,
            projects = report.projects,
            project_parts = report.project_parts,
            runs = report.runs,
            "deleted project category"
        );

        Ok(report)
    }
}

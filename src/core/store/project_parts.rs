//! Project/part association registry
//!
//! Each (project, part) pair has at most one association row. Creation is
//! "insert or fetch": a request for an existing pair returns the stored row
//! untouched, whatever quantity or output flag the caller asked for.

use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use super::{
    require_quantity, row_exists, NewProjectPart, ProjectPart, Result, Store, StoreError,
};
use crate::core::identity::{EntityId, EntityPrefix};

const SELECT_PROJECT_PART: &str = r#"SELECT pp.id, pp.project_id, pp.part_id, p.name, pp.quantity, pp.output
    FROM project_parts pp JOIN parts p ON pp.part_id = p.id"#;

fn project_part_from_row(row: &Row) -> rusqlite::Result<ProjectPart> {
    Ok(ProjectPart {
        id: row.get(0)?,
        project: row.get(1)?,
        part: row.get(2)?,
        part_name: row.get(3)?,
        quantity: row.get(4)?,
        output: row.get(5)?,
    })
}

fn not_found(id: &EntityId) -> StoreError {
    StoreError::NotFound {
        entity: "project part",
        id: id.to_string(),
    }
}

/// Insert the association unless the pair exists, then read the stored row
fn insert_or_fetch(conn: &Connection, request: &NewProjectPart) -> Result<(ProjectPart, bool)> {
    require_quantity(request.quantity)?;

    if !row_exists(conn, "projects", &request.project)? {
        return Err(StoreError::Reference {
            entity: "project",
            id: request.project.to_string(),
        });
    }
    if !row_exists(conn, "parts", &request.part)? {
        return Err(StoreError::Reference {
            entity: "part",
            id: request.part.to_string(),
        });
    }

    let inserted = conn
        .execute(
            r#"INSERT INTO project_parts (id, project_id, part_id, quantity, output)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT (project_id, part_id) DO NOTHING"#,
            params![
                EntityId::new(EntityPrefix::Pp),
                request.project,
                request.part,
                request.quantity,
                request.output
            ],
        )
        .map_err(StoreError::from_sqlite)?;

    let association = conn.query_row(
        &format!(
            "{} WHERE pp.project_id = ?1 AND pp.part_id = ?2",
            SELECT_PROJECT_PART
        ),
        params![request.project, request.part],
        project_part_from_row,
    )?;

    let created = inserted == 1;
    if created {
        info!(id = %association.id, project = %association.project, part = %association.part, "created project part");
    } else {
        debug!(id = %association.id, "project part already exists, returning it");
    }

    Ok((association, created))
}

impl Store {
    /// Associate a part with a project, or return the existing association.
    ///
    /// The returned flag is `true` when a new row was inserted. Uniqueness is
    /// carried by the UNIQUE(project_id, part_id) constraint, so two writers
    /// asking for the same pair end up with the same row.
    pub fn get_or_create_project_part(
        &mut self,
        request: NewProjectPart,
    ) -> Result<(ProjectPart, bool)> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = insert_or_fetch(&tx, &request)?;
        tx.commit()?;
        Ok(result)
    }

    /// Apply a whole parts list in one transaction.
    ///
    /// Either every request lands or none does. Returns how many
    /// associations were added and how many already existed.
    pub fn import_project_parts(&mut self, requests: &[NewProjectPart]) -> Result<(usize, usize)> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let (mut added, mut kept) = (0, 0);
        for request in requests {
            if insert_or_fetch(&tx, request)?.1 {
                added += 1;
            } else {
                kept += 1;
            }
        }
        tx.commit()?;
        info!(added, kept, "imported project parts");

        Ok((added, kept))
    }

    pub fn get_project_part(&self, id: &EntityId) -> Result<ProjectPart> {
        self.conn
            .query_row(
                &format!("{} WHERE pp.id = ?1", SELECT_PROJECT_PART),
                params![id],
                project_part_from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(id))
    }

    /// Every association of a project, ordered by part name
    pub fn project_parts(&self, project: &EntityId) -> Result<Vec<ProjectPart>> {
        self.get_project(project)?;
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE pp.project_id = ?1 ORDER BY p.name, pp.id",
            SELECT_PROJECT_PART
        ))?;
        let rows = stmt
            .query_map(params![project], project_part_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Parts the project consumes
    pub fn project_inputs(&self, project: &EntityId) -> Result<Vec<ProjectPart>> {
        Ok(self
            .project_parts(project)?
            .into_iter()
            .filter(|pp| !pp.output)
            .collect())
    }

    /// Parts the project produces
    pub fn project_outputs(&self, project: &EntityId) -> Result<Vec<ProjectPart>> {
        Ok(self
            .project_parts(project)?
            .into_iter()
            .filter(|pp| pp.output)
            .collect())
    }

    /// Change the quantity or direction of an existing association
    pub fn update_project_part(
        &mut self,
        id: &EntityId,
        quantity: Option<u32>,
        output: Option<bool>,
    ) -> Result<ProjectPart> {
        let mut association = self.get_project_part(id)?;
        if let Some(quantity) = quantity {
            require_quantity(quantity)?;
            association.quantity = quantity;
        }
        if let Some(output) = output {
            association.output = output;
        }

        self.conn.execute(
            "UPDATE project_parts SET quantity = ?1, output = ?2 WHERE id = ?3",
            params![association.quantity, association.output, id],
        )?;

        Ok(association)
    }

    pub fn delete_project_part(&mut self, id: &EntityId) -> Result<()> {
        if self
            .conn
            .execute("DELETE FROM project_parts WHERE id = ?1", params![id])?
            == 0
        {
            return Err(not_found(id));
        }
        info!(id = %id, "deleted project part");
        Ok(())
    }
}

//! Parts

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::{Part, Result, Store, StoreError};
use crate::core::identity::{EntityId, EntityPrefix};

const PART_COLUMNS: &str = "id, name, description";

fn part_from_row(row: &Row) -> rusqlite::Result<Part> {
    Ok(Part {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn insert_part(conn: &Connection, name: &str, description: &str) -> Result<Part> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation("part name must not be empty".into()));
    }

    let part = Part {
        id: EntityId::new(EntityPrefix::Part),
        name: name.to_string(),
        description: description.to_string(),
    };
    conn.execute(
        "INSERT INTO parts (id, name, description) VALUES (?1, ?2, ?3)",
        params![part.id, part.name, part.description],
    )?;
    info!(id = %part.id, name = %part.name, "created part");

    Ok(part)
}

impl Store {
    pub fn create_part(&mut self, name: &str, description: &str) -> Result<Part> {
        insert_part(&self.conn, name, description)
    }

    /// Create several parts in one transaction; nothing is written if any fails
    pub fn import_parts(&mut self, rows: &[(String, String)]) -> Result<Vec<Part>> {
        let tx = self.conn.transaction()?;
        let parts = rows
            .iter()
            .map(|(name, description)| insert_part(&tx, name, description))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;

        Ok(parts)
    }

    pub fn get_part(&self, id: &EntityId) -> Result<Part> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM parts WHERE id = ?1", PART_COLUMNS),
                params![id],
                part_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                entity: "part",
                id: id.to_string(),
            })
    }

    pub fn list_parts(&self) -> Result<Vec<Part>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM parts ORDER BY name, id",
            PART_COLUMNS
        ))?;
        let parts = stmt
            .query_map([], part_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parts)
    }

    /// Parts whose name matches exactly
    pub fn find_parts_by_name(&self, name: &str) -> Result<Vec<Part>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM parts WHERE name = ?1 ORDER BY id",
            PART_COLUMNS
        ))?;
        let parts = stmt
            .query_map(params![name], part_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parts)
    }

    /// Resolve a part by full ID or by unique name
    pub fn resolve_part(&self, reference: &str) -> Result<Part> {
        if let Ok(id) = EntityId::parse_as(reference, EntityPrefix::Part) {
            return self.get_part(&id);
        }

        let mut matches = self.find_parts_by_name(reference)?;
        match matches.len() {
            0 => Err(StoreError::NotFound {
                entity: "part",
                id: reference.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            n => Err(StoreError::Validation(format!(
                "part name '{}' is ambiguous ({} parts share it); use the part ID",
                reference, n
            ))),
        }
    }

    /// Delete a part; its project associations go with it
    pub fn delete_part(&mut self, id: &EntityId) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let associations: i64 = tx.query_row(
            "SELECT COUNT(*) FROM project_parts WHERE part_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let deleted = tx.execute("DELETE FROM parts WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound {
                entity: "part",
                id: id.to_string(),
            });
        }
        tx.commit()?;
        info!(id = %id, associations, "deleted part");

        Ok(associations as usize)
    }
}

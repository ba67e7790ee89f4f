//! Project runs

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::info;

use super::{
    parse_date, require_quantity, row_exists, ProjectRun, Result, StockDelta, Store, StoreError,
    DATE_FORMAT,
};
use crate::core::identity::{EntityId, EntityPrefix};

const RUN_COLUMNS: &str = "id, project_id, quantity, run_date";

fn run_from_row(row: &Row) -> rusqlite::Result<ProjectRun> {
    Ok(ProjectRun {
        id: row.get(0)?,
        project: row.get(1)?,
        quantity: row.get(2)?,
        run_date: parse_date(3, row.get(3)?)?,
    })
}

impl Store {
    /// Record that a project was run `quantity` times today.
    ///
    /// Nothing is checked against the project's part associations.
    pub fn record_run(&mut self, project: &EntityId, quantity: u32) -> Result<ProjectRun> {
        self.insert_run(project, quantity, Utc::now().date_naive())
    }

    fn insert_run(
        &mut self,
        project: &EntityId,
        quantity: u32,
        run_date: NaiveDate,
    ) -> Result<ProjectRun> {
        require_quantity(quantity)?;
        if !row_exists(&self.conn, "projects", project)? {
            return Err(StoreError::Reference {
                entity: "project",
                id: project.to_string(),
            });
        }

        let run = ProjectRun {
            id: EntityId::new(EntityPrefix::Run),
            project: project.clone(),
            quantity,
            run_date,
        };
        self.conn
            .execute(
                "INSERT INTO project_runs (id, project_id, quantity, run_date) VALUES (?1, ?2, ?3, ?4)",
                params![
                    run.id,
                    run.project,
                    run.quantity,
                    run.run_date.format(DATE_FORMAT).to_string()
                ],
            )
            .map_err(StoreError::from_sqlite)?;
        info!(id = %run.id, project = %run.project, quantity, "recorded project run");

        Ok(run)
    }

    pub fn get_run(&self, id: &EntityId) -> Result<ProjectRun> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM project_runs WHERE id = ?1", RUN_COLUMNS),
                params![id],
                run_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound {
                entity: "project run",
                id: id.to_string(),
            })
    }

    /// Runs, newest first, optionally for a single project
    pub fn list_runs(&self, project: Option<&EntityId>) -> Result<Vec<ProjectRun>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM project_runs WHERE (?1 IS NULL OR project_id = ?1) ORDER BY run_date DESC, id DESC",
            RUN_COLUMNS
        ))?;
        let runs = stmt
            .query_map(params![project], run_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }

    /// Stock movement implied by a run: every associated part scaled by the
    /// run quantity, consumed parts negative and produced parts positive.
    /// The deltas are only computed here, never applied.
    pub fn run_stock_deltas(&self, id: &EntityId) -> Result<Vec<StockDelta>> {
        let run = self.get_run(id)?;
        let deltas = self
            .project_parts(&run.project)?
            .into_iter()
            .map(|pp| {
                let magnitude = i64::from(run.quantity) * i64::from(pp.quantity);
                StockDelta {
                    part: pp.part,
                    part_name: pp.part_name,
                    delta: if pp.output { magnitude } else { -magnitude },
                }
            })
            .collect();
        Ok(deltas)
    }
}

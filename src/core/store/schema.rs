//! Database schema initialization

use rusqlite::params;

use super::{Result, Store, SCHEMA_VERSION};

impl Store {
    /// Create all tables on a fresh database
    pub(super) fn init_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Parts referenced by projects
            CREATE TABLE IF NOT EXISTS parts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_parts_name ON parts(name);

            -- Category tree: one optional parent per node
            CREATE TABLE IF NOT EXISTS project_categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                parent_id TEXT REFERENCES project_categories(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_categories_parent ON project_categories(parent_id);
            -- Sibling names are unique, including among roots (NULL parent)
            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_sibling_name
                ON project_categories(COALESCE(parent_id, ''), name);

            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                category_id TEXT NOT NULL REFERENCES project_categories(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_projects_category ON projects(category_id);

            -- Association registry: at most one row per (project, part)
            CREATE TABLE IF NOT EXISTS project_parts (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                part_id TEXT NOT NULL REFERENCES parts(id) ON DELETE CASCADE,
                quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity > 0),
                output INTEGER NOT NULL DEFAULT 0,
                UNIQUE (project_id, part_id)
            );
            CREATE INDEX IF NOT EXISTS idx_project_parts_part ON project_parts(part_id);

            CREATE TABLE IF NOT EXISTS project_runs (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                quantity INTEGER NOT NULL DEFAULT 1 CHECK (quantity > 0),
                run_date TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_project_runs_project ON project_runs(project_id);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        tx.commit()?;

        Ok(())
    }
}

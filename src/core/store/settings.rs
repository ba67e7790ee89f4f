//! Key/value instance settings

use rusqlite::{params, OptionalExtension};

use super::{Result, Store};

/// Setting holding the human readable name of this instance
pub const INSTANCE_SETTING_KEY: &str = "INVENTREE_INSTANCE";

impl Store {
    /// Stored value for `key`, or `default` when unset
    pub fn get_setting(&self, key: &str, default: &str) -> Result<String> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO settings (key, value) VALUES (?1, ?2)
               ON CONFLICT (key) DO UPDATE SET value = excluded.value"#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Instance name, empty when never configured
    pub fn instance_name(&self) -> Result<String> {
        self.get_setting(INSTANCE_SETTING_KEY, "")
    }
}

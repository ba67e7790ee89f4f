//! Store row types

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::identity::EntityId;

/// A part that projects consume or produce
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub id: EntityId,
    pub name: String,
    pub description: String,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Node in the project category tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectCategory {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub parent: Option<EntityId>,
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A category together with its depth below the roots, in tree order
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub depth: usize,
    #[serde(flatten)]
    pub category: ProjectCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub category: EntityId,
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Field changes for [`crate::core::store::Store::update_project`]
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<EntityId>,
}

/// Association of a part with a project.
///
/// `output` is set when the project produces the part rather than consuming it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPart {
    pub id: EntityId,
    pub project: EntityId,
    pub part: EntityId,
    pub part_name: String,
    pub quantity: u32,
    pub output: bool,
}

impl fmt::Display for ProjectPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.quantity, self.part_name)
    }
}

/// Request to associate a part with a project
#[derive(Debug, Clone)]
pub struct NewProjectPart {
    pub project: EntityId,
    pub part: EntityId,
    pub quantity: u32,
    pub output: bool,
}

impl NewProjectPart {
    /// One consumed unit per run, the default association
    pub fn new(project: EntityId, part: EntityId) -> Self {
        Self {
            project,
            part,
            quantity: 1,
            output: false,
        }
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn output(mut self, output: bool) -> Self {
        self.output = output;
        self
    }
}

/// One execution of a project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRun {
    pub id: EntityId,
    pub project: EntityId,
    pub quantity: u32,
    pub run_date: NaiveDate,
}

/// Stock movement a run implies for one part (negative = consumed)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockDelta {
    pub part: EntityId,
    pub part_name: String,
    pub delta: i64,
}

/// Rows removed by a cascading delete
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CascadeReport {
    pub categories: usize,
    pub projects: usize,
    pub project_parts: usize,
    pub runs: usize,
}

/// Store statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub categories: usize,
    pub projects: usize,
    pub parts: usize,
    pub project_parts: usize,
    pub runs: usize,
    pub db_size_bytes: u64,
}

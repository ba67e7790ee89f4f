//! itree: project bookkeeping for an inventory database
//!
//! Project categories, projects, the parts each project consumes or
//! produces, and a record of production runs, kept in a local SQLite file.

pub mod cli;
pub mod core;

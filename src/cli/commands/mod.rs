//! CLI command implementations

pub mod category;
pub mod completions;
pub mod init;
pub mod part;
pub mod project;
pub mod run;
pub mod setting;
pub mod status;
pub mod version;

//! Builtin read-only tools
//!
//! The four capabilities a session may advertise to the model. There is
//! deliberately no tool here that can write, delete, or execute anything.

mod glob;
mod grep;
mod list_directory;
mod read_file;

pub use glob::GlobTool;
pub use grep::GrepTool;
pub use list_directory::ListDirectoryTool;
pub use read_file::ReadFileTool;

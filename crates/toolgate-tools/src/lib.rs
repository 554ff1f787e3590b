//! # Toolgate Tools
//!
//! Tools shipped with the Toolgate server, plus [`default_registry`] which
//! assembles the registry the `toolgate` binary serves.

pub mod report;

pub use report::{DOWNLOAD_REPORT, DownloadReportTool, render_report, report_file_name};

use std::sync::Arc;
use thiserror::Error;
use toolgate_core::{RegistryError, SchemaError, ToolRegistry};

#[derive(Debug, Error)]
pub enum ToolsetError {
    #[error("invalid tool schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("failed to register tool: {0}")]
    Registry(#[from] RegistryError),
}

/// Registry containing every built-in tool.
pub fn default_registry() -> Result<ToolRegistry, ToolsetError> {
    let registry = ToolRegistry::new().try_with_tool(Arc::new(DownloadReportTool::new()?))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_lists_report_tool() {
        let registry = default_registry().unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, [DOWNLOAD_REPORT]);
    }
}

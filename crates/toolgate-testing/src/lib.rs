//! # Toolgate Testing
//!
//! Mock tools and fixture builders shared by the test suites of the Toolgate
//! workspace.

pub mod mock_tools;

pub use mock_tools::{MockBehavior, MockTool};

use std::sync::Arc;
use toolgate_core::{Dispatcher, Tool, ToolRegistry};

/// Build a dispatcher over the given mock tools.
///
/// # Panics
///
/// Panics if two tools share a name.
pub fn dispatcher_with(tools: impl IntoIterator<Item = MockTool>) -> Dispatcher {
    let registry = ToolRegistry::from_tools(
        tools
            .into_iter()
            .map(|tool| Arc::new(tool) as Arc<dyn Tool>),
    )
    .expect("mock tool names must be unique");
    Dispatcher::new(Arc::new(registry))
}

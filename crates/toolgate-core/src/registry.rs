use crate::descriptor::ToolDescriptor;
use crate::error::RegistryError;
use crate::tool::Tool;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A tool together with the descriptor captured at registration.
#[derive(Clone)]
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    tool: Arc<dyn Tool>,
}

impl RegisteredTool {
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }
}

impl fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

/// Ordered set of tools, unique by name.
///
/// The registry is assembled once with [`ToolRegistry::try_with_tool`] and is
/// read-only afterwards; share it behind an `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// let registry = ToolRegistry::new()
///     .try_with_tool(Arc::new(DownloadReportTool::new()?))?;
/// assert_eq!(registry.list()[0].name(), "downloadReport");
/// ```
#[derive(Clone, Default)]
pub struct ToolRegistry {
    descriptors: Vec<ToolDescriptor>,
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name its descriptor declares.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateTool` if the name is taken, or
    /// `RegistryError::EmptyName` if the descriptor has no name.
    pub fn try_with_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, RegistryError> {
        let descriptor = tool.descriptor();
        let name = descriptor.name().to_string();

        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }

        self.index.insert(name, self.tools.len());
        self.descriptors.push(descriptor.clone());
        self.tools.push(RegisteredTool { descriptor, tool });
        Ok(self)
    }

    /// Build a registry from a sequence of tools, in order.
    pub fn from_tools<I>(tools: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        tools
            .into_iter()
            .try_fold(Self::new(), |registry, tool| registry.try_with_tool(tool))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(ToolDescriptor::name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::InputSchema;
    use crate::error::ToolFailure;
    use crate::tool::ToolResult;
    use crate::validation::ValidatedArguments;
    use async_trait::async_trait;

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new(self.0, "test tool", InputSchema::empty())
        }

        async fn execute(&self, _: ValidatedArguments) -> Result<ToolResult, ToolFailure> {
            Ok(ToolResult::text(self.0))
        }
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let registry = ToolRegistry::from_tools([
            Arc::new(NamedTool("b")) as Arc<dyn Tool>,
            Arc::new(NamedTool("a")),
            Arc::new(NamedTool("c")),
        ])
        .unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_every_listed_tool_can_be_looked_up() {
        let registry = ToolRegistry::new()
            .try_with_tool(Arc::new(NamedTool("one")))
            .unwrap()
            .try_with_tool(Arc::new(NamedTool("two")))
            .unwrap();

        for descriptor in registry.list() {
            let entry = registry.lookup(descriptor.name()).unwrap();
            assert_eq!(entry.descriptor().name(), descriptor.name());
        }
        assert!(registry.lookup("three").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ToolRegistry::new()
            .try_with_tool(Arc::new(NamedTool("dup")))
            .unwrap()
            .try_with_tool(Arc::new(NamedTool("dup")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "dup"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ToolRegistry::new()
            .try_with_tool(Arc::new(NamedTool("")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyName));
    }
}

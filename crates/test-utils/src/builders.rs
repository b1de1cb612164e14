//! Registry builders for scheduler and runtime tests.

use std::sync::Arc;

use assetdag::errors::TransformError;
use assetdag::registry::{TaskBody, TaskRegistry, TaskSpec};
use assetdag::transform::{AssetTransform, SharedTransform, TransformContext, TransformReport};
use assetdag::types::BuildMode;

/// A transform that does nothing.
#[derive(Debug)]
pub struct NoopTransform {
    name: String,
}

impl AssetTransform for NoopTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, _ctx: &TransformContext) -> Result<TransformReport, TransformError> {
        Ok(TransformReport::default())
    }
}

pub fn noop_transform(name: &str) -> SharedTransform {
    Arc::new(NoopTransform {
        name: name.to_string(),
    })
}

/// Fluent construction of a `TaskRegistry` from plain task names.
///
/// ```ignore
/// let reg = RegistryBuilder::new()
///     .task("a", &[])
///     .task("b", &["a"])
///     .sequence("all", &[], &["a", "b"])
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    specs: Vec<TaskSpec>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A no-op task with the given prerequisites.
    pub fn task(mut self, name: &str, after: &[&str]) -> Self {
        self.specs.push(
            TaskSpec::new(name, TaskBody::Transforms(vec![noop_transform(name)])).after(after),
        );
        self
    }

    pub fn sequence(mut self, name: &str, after: &[&str], steps: &[&str]) -> Self {
        let steps = steps.iter().map(|s| s.to_string()).collect();
        self.specs
            .push(TaskSpec::new(name, TaskBody::Sequence(steps)).after(after));
        self
    }

    /// Force the mode of the most recently added task.
    pub fn forcing(mut self, mode: BuildMode) -> Self {
        if let Some(last) = self.specs.pop() {
            self.specs.push(last.forcing(mode));
        }
        self
    }

    pub fn spec(mut self, spec: TaskSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Register everything without validating.
    pub fn build_unchecked(self) -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        for spec in self.specs {
            registry
                .register(spec)
                .expect("duplicate task name in RegistryBuilder");
        }
        registry
    }

    /// Register and validate.
    pub fn build(self) -> TaskRegistry {
        let registry = self.build_unchecked();
        registry.validate().expect("RegistryBuilder produced an invalid registry");
        registry
    }
}

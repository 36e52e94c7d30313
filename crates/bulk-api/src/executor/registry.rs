//! Named executor lookup for front ends that pick an executor at runtime.
//!
//! Statically typed callers hand an executor straight to
//! [`BulkApi`](crate::BulkApi) and the compiler checks the capability. Front
//! ends that take the executor name from configuration resolve it here, and an
//! unknown name is reported as a contract violation before any input is read.

use std::collections::BTreeMap;
use std::fmt;

use super::{AutomaticReportExecutor, Executor};
use crate::error::BulkError;

/// Registry name of [`AutomaticReportExecutor`].
pub const REPORT_EXECUTOR: &str = "report";

/// Registry of executors keyed by name.
///
/// # Example
///
/// ```
/// use bulk_api::{ExecutorRegistry, REPORT_EXECUTOR};
///
/// let registry = ExecutorRegistry::with_defaults();
/// assert!(registry.resolve(REPORT_EXECUTOR).is_ok());
/// assert!(registry.resolve("postgres").is_err());
/// ```
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: BTreeMap<String, Box<dyn Executor>>,
}

impl ExecutorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the bundled executors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut executors: BTreeMap<String, Box<dyn Executor>> = BTreeMap::new();
        executors.insert(REPORT_EXECUTOR.to_owned(), Box::new(AutomaticReportExecutor));
        Self { executors }
    }

    /// Registers an executor under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::ContractViolation`] if the name is blank or
    /// already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        executor: Box<dyn Executor>,
    ) -> Result<(), BulkError> {
        let key = name.into();
        if key.trim().is_empty() {
            return Err(BulkError::contract_violation("executor name is empty"));
        }
        if self.executors.contains_key(&key) {
            return Err(BulkError::contract_violation(format!(
                "executor '{key}' is already registered"
            )));
        }
        self.executors.insert(key, executor);
        Ok(())
    }

    /// Resolves an executor by name.
    ///
    /// # Errors
    ///
    /// Returns [`BulkError::ContractViolation`] when no executor is registered
    /// under `name`.
    pub fn resolve(&self, name: &str) -> Result<&dyn Executor, BulkError> {
        self.executors
            .get(name)
            .map(|executor| &**executor)
            .ok_or_else(|| {
                BulkError::contract_violation(format!(
                    "'{name}' is not a registered executor (known: {})",
                    self.names().join(", ")
                ))
            })
    }

    /// Returns the registered names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.executors.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered executors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Returns `true` when no executors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("executors", &self.names())
            .finish()
    }
}

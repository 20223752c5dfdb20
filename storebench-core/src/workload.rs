//! Workload Contract and Registry
//!
//! A workload is one benchmark scenario with three phases per epoch:
//! `prepare` (unmeasured), `execute` (measured) and `cleanup` (unmeasured).
//! A fresh instance is built from its factory for every epoch.
//!
//! Built-in workloads register a [`WorkloadDef`] through `inventory`;
//! [`WorkloadRegistry::builtin`] collects them once at startup.

use crate::error::WorkloadError;
use crate::host::StateStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use storebench_ipc::Messenger;

/// One benchmark scenario
#[async_trait]
pub trait Workload: Send {
    /// Set up backing data (not measured)
    async fn prepare(&mut self) -> Result<(), WorkloadError> {
        Ok(())
    }

    /// The measured operation
    async fn execute(&mut self) -> Result<(), WorkloadError>;

    /// Tear down backing data (not measured)
    async fn cleanup(&mut self) -> Result<(), WorkloadError> {
        Ok(())
    }
}

/// Everything a workload may touch
#[derive(Clone)]
pub struct WorkloadContext {
    /// Host store
    pub store: Arc<dyn StateStore>,
    /// Outbound messaging, absent when running standalone
    pub messenger: Option<Arc<dyn Messenger>>,
    /// Namespace of the benchmarking instance (`benchmark.0`)
    pub namespace: String,
    /// Identifier of the workload being run
    pub workload_id: String,
    /// Operations per epoch
    pub iterations: u64,
    /// Secondary instances taking part in distributed workloads
    pub secondaries: Vec<String>,
}

impl WorkloadContext {
    /// Context for a standalone run against `store`
    pub fn new(store: Arc<dyn StateStore>, namespace: impl Into<String>, iterations: u64) -> Self {
        Self {
            store,
            messenger: None,
            namespace: namespace.into(),
            workload_id: String::new(),
            iterations,
            secondaries: Vec::new(),
        }
    }

    /// Attach a messenger and the secondaries it should address
    pub fn with_messenger(mut self, messenger: Arc<dyn Messenger>, secondaries: Vec<String>) -> Self {
        self.messenger = Some(messenger);
        self.secondaries = secondaries;
        self
    }

    /// Same context bound to another workload id
    pub fn for_workload(&self, workload_id: &str) -> Self {
        Self {
            workload_id: workload_id.to_string(),
            ..self.clone()
        }
    }

    /// Container id of the workload: `<namespace>.<workloadId>`
    pub fn scope(&self) -> String {
        format!("{}.{}", self.namespace, self.workload_id)
    }

    /// Id of the `index`-th test state: `<scope>.testStates.<index>`
    pub fn state_id(&self, index: u64) -> String {
        format!("{}.testStates.{}", self.scope(), index)
    }

    /// Id of the `index`-th test object: `<scope>.testObjects.<index>`
    pub fn object_id(&self, index: u64) -> String {
        format!("{}.testObjects.{}", self.scope(), index)
    }
}

impl fmt::Debug for WorkloadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkloadContext")
            .field("namespace", &self.namespace)
            .field("workload_id", &self.workload_id)
            .field("iterations", &self.iterations)
            .field("secondaries", &self.secondaries)
            .field("messenger", &self.messenger.is_some())
            .finish()
    }
}

/// Builds a workload bound to a context
pub type WorkloadFactory = Arc<dyn Fn(WorkloadContext) -> Box<dyn Workload> + Send + Sync>;

/// Built-in workload registered at link time
#[derive(Debug, Clone)]
pub struct WorkloadDef {
    /// Unique identifier
    pub id: &'static str,
    /// One-line description for listings
    pub description: &'static str,
    /// Needs configured secondaries to run
    pub distributed: bool,
    /// Constructor
    pub factory: fn(WorkloadContext) -> Box<dyn Workload>,
}

inventory::collect!(WorkloadDef);

/// Registered workload
#[derive(Clone)]
pub struct WorkloadEntry {
    /// Workload id
    pub id: String,
    /// One-line description
    pub description: String,
    /// Needs configured secondaries to run
    pub distributed: bool,
    factory: WorkloadFactory,
}

impl WorkloadEntry {
    /// Fresh workload for one epoch
    pub fn instantiate(&self, ctx: WorkloadContext) -> Box<dyn Workload> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for WorkloadEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkloadEntry")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("distributed", &self.distributed)
            .finish()
    }
}

/// Identifier → factory mapping, iterated in ascending identifier order
#[derive(Debug, Clone, Default)]
pub struct WorkloadRegistry {
    entries: BTreeMap<String, WorkloadEntry>,
}

impl WorkloadRegistry {
    /// Registry without any workload
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding every built-in workload
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for def in inventory::iter::<WorkloadDef> {
            let factory = def.factory;
            registry.insert(def.id, def.description, def.distributed, Arc::new(factory));
        }
        registry
    }

    /// Add or replace a workload
    pub fn register<F>(&mut self, id: &str, description: &str, factory: F)
    where
        F: Fn(WorkloadContext) -> Box<dyn Workload> + Send + Sync + 'static,
    {
        self.insert(id, description, false, Arc::new(factory));
    }

    /// Add or replace a workload that needs secondaries
    pub fn register_distributed<F>(&mut self, id: &str, description: &str, factory: F)
    where
        F: Fn(WorkloadContext) -> Box<dyn Workload> + Send + Sync + 'static,
    {
        self.insert(id, description, true, Arc::new(factory));
    }

    fn insert(&mut self, id: &str, description: &str, distributed: bool, factory: WorkloadFactory) {
        self.entries.insert(
            id.to_string(),
            WorkloadEntry {
                id: id.to_string(),
                description: description.to_string(),
                distributed,
                factory,
            },
        );
    }

    /// Look up a workload
    pub fn get(&self, id: &str) -> Option<&WorkloadEntry> {
        self.entries.get(id)
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Identifiers in mapping order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in mapping order
    pub fn iter(&self) -> impl Iterator<Item = &WorkloadEntry> {
        self.entries.values()
    }

    /// Number of registered workloads
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    struct Noop;

    #[async_trait]
    impl Workload for Noop {
        async fn execute(&mut self) -> Result<(), WorkloadError> {
            Ok(())
        }
    }

    #[test]
    fn test_builtin_registry() {
        let registry = WorkloadRegistry::builtin();
        let ids: Vec<_> = registry.ids().collect();
        for id in [
            "delObjects",
            "delStates",
            "idle",
            "secondaryStates",
            "setObjects",
            "setStates",
            "setStatesNonStrict",
            "stateChangeSubscription",
        ] {
            assert!(ids.contains(&id), "missing {id}");
        }
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(registry.get("secondaryStates").unwrap().distributed);
        assert!(!registry.get("idle").unwrap().distributed);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = WorkloadRegistry::empty();
        registry.register("noop", "first", |_| Box::new(Noop));
        registry.register("noop", "second", |_| Box::new(Noop));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("noop").unwrap().description, "second");
    }

    #[test]
    fn test_context_ids() {
        let ctx = WorkloadContext::new(Arc::new(MemoryStore::new()), "benchmark.0", 10)
            .for_workload("setStates");
        assert_eq!(ctx.scope(), "benchmark.0.setStates");
        assert_eq!(ctx.state_id(3), "benchmark.0.setStates.testStates.3");
        assert_eq!(ctx.object_id(0), "benchmark.0.setStates.testObjects.0");
    }
}

//! Job-scoped transform context.

use super::{ContextListener, Disposition, SymbolTable};
use crate::frame::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

type Resource = Arc<dyn Any + Send + Sync>;

/// State shared by every stage for the lifetime of one job run.
///
/// The transform context does not hold the current transaction; the engine
/// passes both contexts explicitly to every stage call.
pub struct TransformContext {
    job_name: String,
    run_id: Uuid,
    symbols: SymbolTable,
    error: Option<String>,
    rows_processed: u64,
    disposition: Disposition,
    listeners: Vec<Arc<dyn ContextListener>>,
    resources: HashMap<String, Resource>,
}

impl TransformContext {
    /// Creates a new transform context for the named job.
    #[must_use]
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            run_id: Uuid::new_v4(),
            symbols: SymbolTable::new(),
            error: None,
            rows_processed: 0,
            disposition: Disposition::default(),
            listeners: Vec::new(),
            resources: HashMap::new(),
        }
    }

    /// Sets a symbol and returns the context.
    #[must_use]
    pub fn with_symbol(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.symbols.put(name, value);
        self
    }

    /// Replaces the symbol table.
    #[must_use]
    pub fn with_symbols(mut self, symbols: SymbolTable) -> Self {
        self.symbols = symbols;
        self
    }

    /// Registers a listener and returns the context.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ContextListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Returns the job name.
    #[must_use]
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Returns the ID of the current run.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the symbol table.
    #[must_use]
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Returns the symbol table mutably.
    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    /// Records a job-level error.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Clears the job-level error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Returns true if a job-level error was recorded.
    #[must_use]
    pub const fn is_in_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the job-level error message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the number of records processed so far in this run.
    #[must_use]
    pub const fn rows_processed(&self) -> u64 {
        self.rows_processed
    }

    /// Records that another record completed its pass.
    pub fn increment_rows(&mut self) {
        self.rows_processed += 1;
    }

    /// Returns the job disposition.
    #[must_use]
    pub const fn disposition(&self) -> &Disposition {
        &self.disposition
    }

    /// Marks the start of a run: new run ID, counters and error reset.
    pub fn start(&mut self) {
        self.run_id = Uuid::new_v4();
        self.rows_processed = 0;
        self.error = None;
        self.disposition.record_start();
    }

    /// Marks the end of a run, capturing counts and error state.
    pub fn end(&mut self) {
        self.disposition
            .record_end(self.rows_processed, self.error.clone());
    }

    /// Exposes another job's disposition as a symbol so that
    /// `jobSuccess(name)` / `jobFailure(name)` can inspect it.
    pub fn register_job(&mut self, symbol: impl Into<String>, other: &Self) {
        self.symbols
            .put(symbol, Value::Frame(other.disposition.to_frame()));
    }

    /// Registers a job-wide listener.
    pub fn add_listener(&mut self, listener: Arc<dyn ContextListener>) {
        self.listeners.push(listener);
    }

    /// Returns the job-wide listeners.
    #[must_use]
    pub fn listeners(&self) -> &[Arc<dyn ContextListener>] {
        &self.listeners
    }

    /// Stores a shared resource (for example a connection handle) under a
    /// name. The job owns it until the context is dropped.
    pub fn insert_resource<T: Any + Send + Sync>(&mut self, name: impl Into<String>, resource: Arc<T>) {
        self.resources.insert(name.into(), resource);
    }

    /// Retrieves a shared resource of the expected type.
    #[must_use]
    pub fn resource<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.resources
            .get(name)
            .cloned()
            .and_then(|r| r.downcast::<T>().ok())
    }

    /// Removes a shared resource.
    pub fn remove_resource(&mut self, name: &str) -> bool {
        self.resources.remove(name).is_some()
    }
}

impl fmt::Debug for TransformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformContext")
            .field("job_name", &self.job_name)
            .field("run_id", &self.run_id)
            .field("symbols", &self.symbols.len())
            .field("error", &self.error)
            .field("rows_processed", &self.rows_processed)
            .field("disposition", &self.disposition)
            .field("listeners", &self.listeners.len())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish()
    }
}

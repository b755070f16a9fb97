//! Schema providers
//!
//! A provider resolves a function name to its immutable [`FunctionSchema`].
//! Providers are constructed once at process start and shared read-only.
//!
//! - [`FileSchemaStore`] reads `<root>/<FUNCTION>.json`
//! - [`InMemorySchemaStore`] holds registered schemas
//! - [`CachedSchemaProvider`] wraps any provider with a single-flight cache

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::observability::{Event, MetricsRegistry};
use crate::BoxFuture;

use super::errors::{SchemaError, SchemaResult};
use super::loader::parse_schema_text;
use super::types::FunctionSchema;

/// Resolves function names to schemas
pub trait SchemaProvider: Send + Sync {
    /// Loads the schema for `function_name`.
    ///
    /// Returns a `GW_SCHEMA_NOT_FOUND` error for unknown names.
    fn load_schema<'a>(&'a self, function_name: &'a str)
        -> BoxFuture<'a, SchemaResult<Arc<FunctionSchema>>>;
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for Arc<P> {
    fn load_schema<'a>(
        &'a self,
        function_name: &'a str,
    ) -> BoxFuture<'a, SchemaResult<Arc<FunctionSchema>>> {
        (**self).load_schema(function_name)
    }
}

/// Function names are restricted to characters that cannot escape the
/// metadata directory.
pub fn is_valid_function_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Metadata documents on disk, one file per function
#[derive(Debug, Clone)]
pub struct FileSchemaStore {
    root: PathBuf,
}

impl FileSchemaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the metadata document for a function
    pub fn path_for(&self, function_name: &str) -> PathBuf {
        self.root.join(format!("{}.json", function_name))
    }

    async fn read(&self, function_name: &str) -> SchemaResult<Arc<FunctionSchema>> {
        if !is_valid_function_name(function_name) {
            return Err(SchemaError::not_found(function_name));
        }

        let path = self.path_for(function_name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SchemaError::not_found(function_name));
            }
            Err(e) => {
                return Err(SchemaError::load_failed(
                    function_name,
                    format!("cannot read {}: {}", path.display(), e),
                ));
            }
        };

        let text = String::from_utf8(bytes).map_err(|_| {
            SchemaError::malformed("$", "metadata is not valid UTF-8").for_function(function_name)
        })?;

        let schema = parse_schema_text(&text).map_err(|e| e.for_function(function_name))?;

        if schema.function_name != function_name {
            return Err(SchemaError::malformed(
                "function_name",
                format!(
                    "document declares '{}' but is stored as '{}'",
                    schema.function_name, function_name
                ),
            )
            .for_function(function_name));
        }

        debug!(path = %path.display(), function = function_name, "metadata document parsed");
        Ok(Arc::new(schema))
    }
}

impl SchemaProvider for FileSchemaStore {
    fn load_schema<'a>(
        &'a self,
        function_name: &'a str,
    ) -> BoxFuture<'a, SchemaResult<Arc<FunctionSchema>>> {
        Box::pin(self.read(function_name))
    }
}

/// Schemas registered in memory
#[derive(Debug, Default)]
pub struct InMemorySchemaStore {
    schemas: RwLock<HashMap<String, Arc<FunctionSchema>>>,
}

impl InMemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_schema(self, schema: FunctionSchema) -> Self {
        self.register(schema);
        self
    }

    /// Registers a schema under its function name, replacing any previous one.
    pub fn register(&self, schema: FunctionSchema) {
        let mut schemas = match self.schemas.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        schemas.insert(schema.function_name.clone(), Arc::new(schema));
    }

    fn get(&self, function_name: &str) -> Option<Arc<FunctionSchema>> {
        let schemas = match self.schemas.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        schemas.get(function_name).cloned()
    }
}

impl SchemaProvider for InMemorySchemaStore {
    fn load_schema<'a>(
        &'a self,
        function_name: &'a str,
    ) -> BoxFuture<'a, SchemaResult<Arc<FunctionSchema>>> {
        Box::pin(async move {
            self.get(function_name)
                .ok_or_else(|| SchemaError::not_found(function_name))
        })
    }
}

type CacheCell = Arc<OnceCell<Arc<FunctionSchema>>>;

/// Single-flight schema cache
///
/// Concurrent lookups of the same uncached name share one load of the
/// inner provider. Failed loads are not cached and leave no entry behind.
/// Loaded entries are never evicted unless [`invalidate`](Self::invalidate) or [`clear`](Self::clear) is called.
pub struct CachedSchemaProvider<P> {
    inner: P,
    cells: Mutex<HashMap<String, CacheCell>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<P: SchemaProvider> CachedSchemaProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cells: Mutex::new(HashMap::new()),
            metrics: None,
        }
    }

    /// Counts cache hits in the given registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Drops the cached schema for one function.
    pub fn invalidate(&self, function_name: &str) {
        self.lock_cells().remove(function_name);
    }

    /// Drops every cached schema.
    pub fn clear(&self) {
        self.lock_cells().clear();
    }

    /// Number of function names with a populated entry
    pub fn cached_count(&self) -> usize {
        self.lock_cells()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    fn lock_cells(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheCell>> {
        match self.cells.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn cell_for(&self, function_name: &str) -> CacheCell {
        Arc::clone(self.lock_cells().entry(function_name.to_string()).or_default())
    }

    async fn load(&self, function_name: &str) -> SchemaResult<Arc<FunctionSchema>> {
        let cell = self.cell_for(function_name);

        if let Some(schema) = cell.get() {
            if let Some(metrics) = &self.metrics {
                metrics.increment_schema_cache_hits();
            }
            debug!(event = Event::SchemaCacheHit.as_str(), function = function_name);
            return Ok(Arc::clone(schema));
        }

        match cell
            .get_or_try_init(|| self.inner.load_schema(function_name))
            .await
        {
            Ok(schema) => Ok(Arc::clone(schema)),
            Err(err) => {
                self.evict_empty(function_name, &cell);
                Err(err)
            }
        }
    }

    /// Removes the entry for `function_name` if it is still `cell` and empty.
    fn evict_empty(&self, function_name: &str, cell: &CacheCell) {
        let mut cells = self.lock_cells();
        let stale = cells
            .get(function_name)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            cells.remove(function_name);
        }
    }
}

impl<P: SchemaProvider> SchemaProvider for CachedSchemaProvider<P> {
    fn load_schema<'a>(
        &'a self,
        function_name: &'a str,
    ) -> BoxFuture<'a, SchemaResult<Arc<FunctionSchema>>> {
        Box::pin(self.load(function_name))
    }
}

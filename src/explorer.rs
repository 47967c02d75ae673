//! Shared state behind every tool call.
//!
//! [`Explorer`] owns the connection pool and the collaborators wired to it.
//! It holds no catalog: each operation builds its own from scratch.

use crate::catalog::{CatalogBuilder, build_graph};
use crate::db::{ColumnReflector, DbPool, QueryExecutor, SqlxReflector};
use crate::error::{ExplorerError, ExplorerResult};
use crate::metadata::{EntityMetadataProvider, ManifestMetadataProvider};
use crate::models::{
    Catalog, DEFAULT_QUERY_TIMEOUT_SECS, QueryRequest, QueryResult, RelationshipGraph,
    SearchResult, ValueSearchReport,
};
use crate::search::{self, SearchSettings, SqlxTableScanner, TableScanner};
use crate::tools::sql_validator::KeywordPolicy;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct Explorer {
    pool: DbPool,
    reflector: Arc<dyn ColumnReflector>,
    provider: Arc<dyn EntityMetadataProvider>,
    scanner: Arc<dyn TableScanner>,
    executor: QueryExecutor,
    settings: SearchSettings,
    include_unowned: bool,
    default_query_timeout: Duration,
}

impl Explorer {
    /// Create an explorer over `pool` with the SQL-backed reflector and scanner
    /// and no entity metadata.
    pub fn new(pool: DbPool) -> Self {
        Self {
            reflector: Arc::new(SqlxReflector::new(pool.clone())),
            scanner: Arc::new(SqlxTableScanner::new(pool.clone())),
            provider: Arc::new(ManifestMetadataProvider::empty()),
            executor: QueryExecutor::default(),
            settings: SearchSettings::default(),
            include_unowned: true,
            default_query_timeout: Duration::from_secs(u64::from(DEFAULT_QUERY_TIMEOUT_SECS)),
            pool,
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn EntityMetadataProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_reflector(mut self, reflector: Arc<dyn ColumnReflector>) -> Self {
        self.reflector = reflector;
        self
    }

    pub fn with_scanner(mut self, scanner: Arc<dyn TableScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_keyword_policy(mut self, policy: KeywordPolicy) -> Self {
        self.executor = QueryExecutor::new(policy);
        self
    }

    pub fn with_search_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Also catalog physical tables no entity type owns. Default: true
    pub fn include_unowned(mut self, include: bool) -> Self {
        self.include_unowned = include;
        self
    }

    /// Timeout used when a query request does not name one.
    pub fn with_default_query_timeout(mut self, timeout: Duration) -> Self {
        self.default_query_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Build a fresh catalog.
    pub async fn catalog(&self) -> ExplorerResult<Catalog> {
        CatalogBuilder::new(self.reflector.as_ref(), self.provider.as_ref())
            .include_unowned(self.include_unowned)
            .build()
            .await
    }

    /// Build a fresh catalog and derive its relationship graph.
    pub async fn relationships(
        &self,
        entity_type: Option<&str>,
        bundle: Option<&str>,
    ) -> ExplorerResult<RelationshipGraph> {
        let catalog = self.catalog().await?;
        build_graph(&catalog, entity_type, bundle)
    }

    pub async fn search_by_value(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> ExplorerResult<ValueSearchReport> {
        let catalog = self.catalog().await?;
        search::search_by_value(&catalog, self.scanner.as_ref(), term, limit, &self.settings).await
    }

    pub async fn search_by_field_name(&self, term: &str) -> ExplorerResult<Vec<SearchResult>> {
        let catalog = self.catalog().await?;
        search::search_by_field_name(&catalog, term)
    }

    /// Execute a read-only query with the request's row limit and timeout.
    ///
    /// Returns the result and whether rows were dropped by the limit.
    pub async fn query(&self, request: &QueryRequest) -> ExplorerResult<(QueryResult, bool)> {
        if request.sql.trim().is_empty() {
            return Err(ExplorerError::invalid_input("SQL query cannot be empty"));
        }

        let timeout_secs = match request.timeout_secs {
            Some(_) => request.effective_timeout(),
            None => self.default_query_timeout.as_secs().max(1) as u32,
        };
        let execution =
            self.executor
                .execute_bounded(&self.pool, &request.sql, request.effective_limit());
        let (result, truncated) =
            match tokio::time::timeout(Duration::from_secs(u64::from(timeout_secs)), execution).await {
                Ok(result) => result?,
                Err(_) => return Err(ExplorerError::timeout("query", timeout_secs)),
            };

        info!(
            row_count = result.row_count,
            truncated,
            execution_time_ms = result.execution_time_ms,
            "Query executed"
        );
        Ok((result, truncated))
    }
}

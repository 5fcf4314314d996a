//! Query engine facade: compile EQL (or accept criteria-built SQM),
//! translate, render, cache, and execute.
//!
//! The engine owns the shared, read-mostly structures - domain model,
//! configuration, compiled-query cache - and hands per-execution state to
//! the exec layer.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::cache::{InterpretationCache, InterpretationCacheKey};
use crate::config::EngineConfig;
use crate::domain_model::DomainModel;
use crate::eql_parser;
use crate::exec::{
    self, ExecutionError, ExecutionOptions, ManagedInstanceFactory, ParameterBindings,
    ResultSequence, StatementExecutor,
};
use crate::sql_renderer::{AnsiSqlRenderer, RenderedSql, SqlRenderError, SqlRenderer};
use crate::sqm::{self, SemanticError, SqmStatement};
use crate::translator::{self, Translation, TranslationError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Parse error:\n{0}")]
    Parse(String),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Render(#[from] SqlRenderError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("Statement is not a select")]
    NotASelect,
    #[error("Statement is not a DML statement")]
    NotDml,
}

/// A fully compiled statement: the typed SQM tree, the lowered SQL AST with
/// its result-mapping plan, and the rendered SQL text with parameter order.
/// Immutable; shared across executions via `Arc`.
#[derive(Debug)]
pub struct CompiledQuery {
    pub statement: SqmStatement,
    pub translation: Translation,
    pub rendered: RenderedSql,
}

impl CompiledQuery {
    pub fn is_select(&self) -> bool {
        matches!(self.statement, SqmStatement::Select(_))
    }
}

pub struct QueryEngine {
    model: Arc<DomainModel>,
    config: EngineConfig,
    renderer: Box<dyn SqlRenderer + Send + Sync>,
    interpretation_cache: InterpretationCache<Arc<CompiledQuery>>,
}

impl QueryEngine {
    pub fn new(model: Arc<DomainModel>, config: EngineConfig) -> Self {
        QueryEngine {
            model,
            config,
            renderer: Box::new(AnsiSqlRenderer),
            interpretation_cache: InterpretationCache::from_env(),
        }
    }

    /// Swap the rendering strategy (dialect-specific SQL shapes).
    pub fn with_renderer(mut self, renderer: Box<dyn SqlRenderer + Send + Sync>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn model(&self) -> &Arc<DomainModel> {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile a query text into an executable handle, reusing the
    /// compiled-query cache. Nothing is published to the cache unless the
    /// whole pipeline - parse, interpret, translate, render - succeeded.
    pub fn compile(&self, query: &str) -> Result<Arc<CompiledQuery>, EngineError> {
        let key = InterpretationCacheKey::new(query);
        if let Some(hit) = self.interpretation_cache.get(&key) {
            debug!("compiled-query cache hit: {}", key.fingerprint());
            return Ok(hit);
        }

        let stripped = eql_parser::strip_comments(query);
        let ast = eql_parser::parse_statement(&stripped)
            .map_err(|e| EngineError::Parse(e.to_string()))?;
        let statement = sqm::interpret_statement(&ast, &self.model, &self.config)?;
        let compiled = Arc::new(self.compile_sqm(statement)?);

        debug!("compiled and cached query {}", key.fingerprint());
        self.interpretation_cache.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Compile a criteria-built SQM statement. Criteria compilations are
    /// not text-keyed, so they bypass the interpretation cache.
    pub fn compile_sqm(&self, statement: SqmStatement) -> Result<CompiledQuery, EngineError> {
        let translation = self.translate(&statement)?;
        let rendered = self.renderer.render(&translation.statement)?;
        debug!("rendered sql: {}", rendered.sql);
        Ok(CompiledQuery {
            statement,
            translation,
            rendered,
        })
    }

    /// Lower an SQM tree into the SQL AST and result-mapping plan.
    pub fn translate(&self, statement: &SqmStatement) -> Result<Translation, EngineError> {
        Ok(translator::translate_statement(statement, &self.model)?)
    }

    /// Execute a compiled select, producing the lazy result sequence.
    pub fn execute<'f>(
        &self,
        compiled: &CompiledQuery,
        bindings: &ParameterBindings,
        executor: &dyn StatementExecutor,
        factory: &'f dyn ManagedInstanceFactory,
    ) -> Result<ResultSequence<'f>, EngineError> {
        if !compiled.is_select() {
            return Err(EngineError::NotASelect);
        }
        let params = exec::bind_parameters(&compiled.rendered.parameters, bindings)?;
        let options = self.execution_options();
        Ok(exec::execute_select(
            executor,
            &compiled.rendered.sql,
            &params,
            &options,
            compiled.translation.result_plan.clone(),
            factory,
        )?)
    }

    /// Execute a compiled DML statement, returning the affected-row count.
    pub fn execute_update(
        &self,
        compiled: &CompiledQuery,
        bindings: &ParameterBindings,
        executor: &dyn StatementExecutor,
    ) -> Result<u64, EngineError> {
        if compiled.is_select() {
            return Err(EngineError::NotDml);
        }
        let params = exec::bind_parameters(&compiled.rendered.parameters, bindings)?;
        let options = self.execution_options();
        Ok(executor.execute_update(&compiled.rendered.sql, &params, &options)?)
    }

    fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            timeout: match self.config.query_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            tenant: self.config.default_tenant.clone(),
        }
    }

    pub fn cache_metrics(&self) -> crate::cache::CacheMetrics {
        self.interpretation_cache.metrics()
    }
}

//! Generation orchestration.
//!
//! [`generate`] runs the whole pipeline once per record: it builds the
//! schema, checks it against every requested dialect and compiles the
//! statement templates of the repository contract. The result is handed to an
//! [`Emitter`], which owns the rendering of source artifacts.

use serde::Serialize;

use crate::aggregate::Aggregate;
use crate::builder::value::SqlValue;
use crate::builder::{Aggregation, Create, Delete, Query, Update};
use crate::compiler::{CompileOptions, Compiler, WritePolicy};
use crate::dialect::{Dialect, IdentityStrategy};
use crate::error::Result;
use crate::predicate::Predicate;
use crate::schema::{build_schema, RecordDescriptor, Schema};

/// Operations of the generated repository contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Method {
    /// Opens a transaction.
    Tx,
    /// Inserts one row.
    Create,
    /// Inserts one row inside a caller transaction.
    CreateTx,
    /// Inserts a batch of rows.
    CreateMany,
    /// Inserts a batch inside a caller transaction.
    CreateManyTx,
    /// Selects matching rows.
    Query,
    /// Selects inside a caller transaction.
    QueryTx,
    /// Selects exactly one row.
    QueryOne,
    /// Selects one row inside a caller transaction.
    QueryOneTx,
    /// Updates matching rows.
    Update,
    /// Updates inside a caller transaction.
    UpdateTx,
    /// Deletes matching rows.
    Delete,
    /// Deletes inside a caller transaction.
    DeleteTx,
    /// Runs an aggregate select.
    Aggregate,
    /// Aggregates inside a caller transaction.
    AggregateTx,
}

impl Method {
    /// Every method, in contract order.
    pub const ALL: [Self; 15] = [
        Self::Tx,
        Self::Create,
        Self::CreateTx,
        Self::CreateMany,
        Self::CreateManyTx,
        Self::Query,
        Self::QueryTx,
        Self::QueryOne,
        Self::QueryOneTx,
        Self::Update,
        Self::UpdateTx,
        Self::Delete,
        Self::DeleteTx,
        Self::Aggregate,
        Self::AggregateTx,
    ];

    /// Returns the method name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tx => "Tx",
            Self::Create => "Create",
            Self::CreateTx => "CreateTx",
            Self::CreateMany => "CreateMany",
            Self::CreateManyTx => "CreateManyTx",
            Self::Query => "Query",
            Self::QueryTx => "QueryTx",
            Self::QueryOne => "QueryOne",
            Self::QueryOneTx => "QueryOneTx",
            Self::Update => "Update",
            Self::UpdateTx => "UpdateTx",
            Self::Delete => "Delete",
            Self::DeleteTx => "DeleteTx",
            Self::Aggregate => "Aggregate",
            Self::AggregateTx => "AggregateTx",
        }
    }

    /// Returns whether the method takes a caller transaction.
    #[must_use]
    pub const fn takes_tx(self) -> bool {
        matches!(
            self,
            Self::CreateTx
                | Self::CreateManyTx
                | Self::QueryTx
                | Self::QueryOneTx
                | Self::UpdateTx
                | Self::DeleteTx
                | Self::AggregateTx
        )
    }
}

/// A compiled statement shape with its argument count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementTemplate {
    /// Method the template belongs to.
    pub method: Method,
    /// SQL text.
    pub sql: String,
    /// Number of arguments the SQL expects.
    pub params: usize,
}

/// Everything a dialect-specific repository needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendPlan {
    /// Dialect name.
    pub dialect: &'static str,
    /// How inserted identities are read back.
    pub identity: IdentityStrategy,
    /// Templates for single-row writes and ident-keyed lookups.
    pub templates: Vec<StatementTemplate>,
}

/// Structured output of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedRepository {
    /// Resolved schema.
    pub schema: Schema,
    /// Storage names of the columns written by inserts and updates.
    pub write_columns: Vec<String>,
    /// Repository method table.
    pub methods: Vec<Method>,
    /// One plan per requested dialect.
    pub backends: Vec<BackendPlan>,
}

impl GeneratedRepository {
    /// Returns the plan of a dialect.
    #[must_use]
    pub fn backend(&self, dialect: &str) -> Option<&BackendPlan> {
        self.backends.iter().find(|b| b.dialect == dialect)
    }
}

/// Renders a generated repository into source artifacts.
pub trait Emitter {
    /// Rendered artifact.
    type Output;
    /// Rendering failure.
    type Error;

    /// Renders one repository.
    fn emit(&mut self, repository: &GeneratedRepository) -> std::result::Result<Self::Output, Self::Error>;
}

/// Emits the repository as a pretty-printed JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEmitter;

impl Emitter for JsonEmitter {
    type Output = String;
    type Error = serde_json::Error;

    fn emit(&mut self, repository: &GeneratedRepository) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(repository)
    }
}

/// Builds the schema of `record` and compiles the repository plans for every
/// dialect.
///
/// Any schema, type or dialect error aborts the run.
pub fn generate(record: &RecordDescriptor, dialects: &[Dialect]) -> Result<GeneratedRepository> {
    let schema = build_schema(record)?;
    let mut backends = Vec::with_capacity(dialects.len());
    for dialect in dialects {
        let compiler = Compiler::new(&schema, *dialect)
            .with_options(CompileOptions::default().write_policy(WritePolicy::KeepExplicit));
        compiler.validate_schema()?;
        backends.push(BackendPlan {
            dialect: dialect.name(),
            identity: dialect.identity_strategy(),
            templates: templates(&compiler)?,
        });
    }

    Ok(GeneratedRepository {
        write_columns: schema.write_columns().map(|c| c.name.clone()).collect(),
        methods: Method::ALL.to_vec(),
        backends,
        schema,
    })
}

fn templates(compiler: &Compiler<'_>) -> Result<Vec<StatementTemplate>> {
    let schema = compiler.schema();
    let ident = &schema.ident().name;
    let placeholder = || SqlValue::Text(String::new());

    let create = schema
        .write_columns()
        .fold(Create::new(), |create, column| create.set(&column.name, placeholder()));
    let update = schema
        .write_columns()
        .fold(Update::new(), |update, column| update.set(&column.name, placeholder()))
        .filter(Predicate::eq(ident, placeholder()));
    let by_ident = Query::new().filter(Predicate::eq(ident, placeholder()));

    let mut plans = vec![
        (Method::Create, compiler.insert_one(&create)?),
        (Method::Query, compiler.select(&Query::new())?),
        (Method::QueryOne, compiler.select_one(&by_ident)?),
        (
            Method::Delete,
            compiler.delete(&Delete::new().filter(Predicate::eq(ident, placeholder())))?,
        ),
        (
            Method::Aggregate,
            compiler.aggregate(&Aggregation::new().aggregate(Aggregate::count(ident)))?,
        ),
    ];
    // Auto-only schemas have nothing to update.
    if schema.write_columns().next().is_some() {
        plans.insert(3, (Method::Update, compiler.update(&update)?));
    }

    Ok(plans
        .into_iter()
        .map(|(method, plan)| StatementTemplate {
            method,
            params: plan.args().len(),
            sql: plan.into_parts().0,
        })
        .collect())
}

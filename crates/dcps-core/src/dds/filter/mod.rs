// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Content Filter Expression Parser and Evaluator
//!
//! SQL-like filter expressions for content-filtered topics.
//!
//! # Supported Syntax
//!
//! ```text
//! expression ::= condition
//!              | expression AND expression
//!              | expression OR expression
//!              | NOT expression
//!              | '(' expression ')'
//!
//! condition  ::= operand operator operand      (at least one operand is a field)
//!
//! operator   ::= '>' | '<' | '>=' | '<=' | '=' | '==' | '<>' | '!=' | LIKE
//!
//! operand    ::= field_name | parameter | literal
//! parameter  ::= '%' digit+
//! literal    ::= integer | float | string | TRUE | FALSE
//! ```
//!
//! Keywords are case-insensitive. Parameters are materialized once when they
//! are bound, and can be rebound later without recompiling the expression.
//!
//! # Example
//!
//! ```ignore
//! let filter = ContentFilter::compile(
//!     "degrees > %0 or degrees < %1",
//!     vec!["32".to_string(), "30".to_string()],
//! )?;
//! filter.set_parameters(vec!["35".to_string(), "28".to_string()])?;
//! ```

mod evaluator;
mod parser;

pub use evaluator::{FieldValue, FilterEvaluator};
pub use parser::{parse_expression, Expression, Operator, Value};

use crate::dds::type_support::TypeShape;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Parameter list as supplied by the application plus its materialized values.
#[derive(Debug)]
pub(crate) struct BoundParameters {
    raw: Vec<String>,
    values: Vec<FieldValue>,
}

impl BoundParameters {
    fn bind(raw: Vec<String>) -> Self {
        let values = raw.iter().map(|p| FieldValue::from_parameter(p)).collect();
        Self { raw, values }
    }
}

/// A parsed filter expression together with its current parameter binding.
///
/// Clones and every [`FilterEvaluator`] handed out share one binding, so
/// [`set_parameters`](Self::set_parameters) is seen by all of them.
#[derive(Clone)]
pub struct ContentFilter {
    source: String,
    ast: Arc<Expression>,
    binding: Arc<ArcSwap<BoundParameters>>,
    name: Option<String>,
}

impl ContentFilter {
    /// Parse `expression` and bind `parameters` to its `%n` placeholders.
    ///
    /// The parameter count must equal the highest placeholder index plus one.
    pub fn compile(expression: &str, parameters: Vec<String>) -> Result<Self, FilterError> {
        let ast = parse_expression(expression)?;
        expect_arity(&ast, &parameters)?;
        Ok(Self {
            source: expression.to_owned(),
            ast: Arc::new(ast),
            binding: Arc::new(ArcSwap::from_pointee(BoundParameters::bind(parameters))),
            name: None,
        })
    }

    /// Rebind the placeholders. Evaluations already running keep the old values;
    /// on error the previous binding is untouched.
    pub fn set_parameters(&self, parameters: Vec<String>) -> Result<(), FilterError> {
        expect_arity(&self.ast, &parameters)?;
        self.binding.store(Arc::new(BoundParameters::bind(parameters)));
        Ok(())
    }

    pub fn parameters(&self) -> Vec<String> {
        self.binding.load().raw.clone()
    }

    pub fn expression(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expression {
        &self.ast
    }

    /// Label used in log output.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Fails on the first referenced field that `shape` does not declare.
    pub fn validate_fields(&self, shape: &TypeShape) -> Result<(), FilterError> {
        match self
            .ast
            .field_names()
            .into_iter()
            .find(|field| !shape.has_field(field))
        {
            Some(unknown) => Err(FilterError::UnknownField(unknown.to_string())),
            None => Ok(()),
        }
    }

    pub fn evaluator(&self) -> FilterEvaluator {
        FilterEvaluator::new(Arc::clone(&self.ast), Arc::clone(&self.binding))
    }
}

impl std::fmt::Debug for ContentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentFilter({:?}", self.source)?;
        if let Some(name) = &self.name {
            write!(f, " as {:?}", name)?;
        }
        write!(f, ", params={:?})", self.binding.load().raw)
    }
}

fn expect_arity(ast: &Expression, parameters: &[String]) -> Result<(), FilterError> {
    match (ast.parameter_arity(), parameters.len()) {
        (expected, found) if expected == found => Ok(()),
        (expected, found) => Err(FilterError::ParameterCount { expected, found }),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Malformed expression; the message carries the byte offset.
    ParseError(String),
    UnknownField(String),
    /// `%n` with no bound value.
    ParameterOutOfRange(usize),
    ParameterCount { expected: usize, found: usize },
    /// Operands of a comparison cannot be compared.
    TypeMismatch(String),
    EmptyExpression,
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use FilterError::*;
        match self {
            ParseError(msg) => write!(f, "invalid filter: {}", msg),
            UnknownField(field) => write!(f, "filter references unknown field '{}'", field),
            ParameterOutOfRange(idx) => write!(f, "no value bound for %{}", idx),
            ParameterCount { expected, found } => {
                write!(f, "filter takes {} parameter(s), got {}", expected, found)
            }
            TypeMismatch(msg) => write!(f, "filter type mismatch: {}", msg),
            EmptyExpression => f.write_str("filter expression is empty"),
        }
    }
}

impl std::error::Error for FilterError {}

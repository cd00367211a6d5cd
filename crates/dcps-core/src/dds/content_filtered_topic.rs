// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ContentFilteredTopic - filtered view of a Topic
//!
//! A ContentFilteredTopic is a Topic plus an SQL-like predicate. DataReaders
//! created on it only receive the samples (and lifecycle notifications) the
//! predicate admits; DataWriters created on it publish on the related topic.
//!
//! The expression is compiled once. Its `%n` parameters can be rebound at
//! any time; the new values apply to samples written afterwards.
//!
//! # Example
//!
//! ```ignore
//! // Chocolate temperature outside of the tempering range
//! let out_of_range = participant.create_content_filtered_topic(
//!     "ChocolateTemperatureOutOfRange",
//!     &temperature_topic,
//!     "degrees > %0 or degrees < %1",
//!     vec!["32".to_string(), "30".to_string()],
//! )?;
//!
//! let alarms = participant.create_reader(&out_of_range, QoS::reliable())?;
//!
//! // Widen the range at runtime
//! out_of_range.set_expression_parameters(vec!["33".into(), "29".into()])?;
//! ```

use super::filter::ContentFilter;
use super::topic::Topic;
use super::{DdsType, Error, Result};

/// A filtered view of a Topic.
///
/// Clones share the same filter: rebinding parameters through any clone
/// affects every reader created on the view.
///
/// The expression grammar is documented in [`crate::dds::filter`].
pub struct ContentFilteredTopic<T: DdsType> {
    /// Name of this filtered topic
    name: String,

    /// Underlying topic
    related: Topic<T>,

    /// Compiled filter with its bound parameters
    filter: ContentFilter,
}

impl<T: DdsType> ContentFilteredTopic<T> {
    /// Compile `expression` against the related topic's type shape.
    ///
    /// Fails with `FilterSyntax` on a malformed expression, an unknown field
    /// or a parameter count that does not match the placeholders.
    pub(crate) fn new(
        name: &str,
        related: &Topic<T>,
        expression: &str,
        parameters: Vec<String>,
    ) -> Result<Self> {
        let syntax_error = |source| Error::FilterSyntax {
            expression: expression.to_string(),
            source,
        };

        let filter = ContentFilter::compile(expression, parameters)
            .map_err(syntax_error)?
            .with_name(name);
        filter
            .validate_fields(related.shape())
            .map_err(syntax_error)?;

        log::debug!(
            "[CFT] created '{}' on '{}' filter=\"{}\"",
            name,
            related.name(),
            expression
        );

        Ok(Self {
            name: name.to_string(),
            related: related.clone(),
            filter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Topic whose samples this view selects from.
    pub fn related_topic(&self) -> &Topic<T> {
        &self.related
    }

    pub fn related_topic_name(&self) -> &str {
        self.related.name()
    }

    pub fn filter_expression(&self) -> &str {
        self.filter.expression()
    }

    /// Parameters as last bound, in `%n` order.
    pub fn expression_parameters(&self) -> Vec<String> {
        self.filter.parameters()
    }

    /// Rebind the expression parameters.
    ///
    /// The expression is not recompiled. The parameter count must still
    /// match the placeholders; on error the previous binding stays in effect.
    pub fn set_expression_parameters(&self, parameters: Vec<String>) -> Result<()> {
        self.filter
            .set_parameters(parameters)
            .map_err(|source| Error::FilterSyntax {
                expression: self.filter.expression().to_string(),
                source,
            })?;
        log::debug!(
            "[CFT] '{}' parameters now {:?}",
            self.name,
            self.filter.parameters()
        );
        Ok(())
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }
}

impl<T: DdsType> Clone for ContentFilteredTopic<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            related: self.related.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<T: DdsType> std::fmt::Debug for ContentFilteredTopic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ContentFilteredTopic({} on {}: {:?})",
            self.name,
            self.related.name(),
            self.filter
        )
    }
}

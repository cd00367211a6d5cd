// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DCPS Topic
//!
//! A [`Topic`] represents a named data channel with an associated registered
//! type. Topics are the connection point between DataWriters and DataReaders.
//!
//! ## Overview
//!
//! A Topic defines:
//! - A **name** (unique per participant)
//! - A **type name** (registered in the participant's type registry)
//! - The set of readers and writers attached to it
//!
//! ## Example
//!
//! ```rust,ignore
//! let participant = Participant::new("factory")?;
//! participant.register_type(temperature_support())?;
//!
//! let topic = participant.create_topic::<Temperature>("ChocolateTemperature", "Temperature")?;
//! let writer = participant.create_writer(&topic, QoS::reliable())?;
//! let reader = participant.create_reader(&topic, QoS::reliable())?;
//! ```

use super::content_filtered_topic::ContentFilteredTopic;
use super::filter::ContentFilter;
use super::participant::registry::Endpoints;
use super::type_support::{TypeShape, TypeSupport};
use super::DdsType;
use std::sync::Arc;

/// State shared by every handle of one topic.
pub(crate) struct TopicShared<T: DdsType> {
    name: String,
    support: Arc<TypeSupport<T>>,
    endpoints: Endpoints<T>,
}

impl<T: DdsType> TopicShared<T> {
    pub(crate) fn new(name: &str, support: Arc<TypeSupport<T>>) -> Self {
        Self {
            name: name.to_string(),
            support,
            endpoints: Endpoints::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn support(&self) -> &TypeSupport<T> {
        &self.support
    }

    pub(crate) fn endpoints(&self) -> &Endpoints<T> {
        &self.endpoints
    }
}

/// A typed Topic - a named data channel.
///
/// Cheap to clone; clones refer to the same topic.
///
/// # Type Parameter
///
/// * `T` - The sample type, must implement [`DdsType`]
pub struct Topic<T: DdsType> {
    shared: Arc<TopicShared<T>>,
}

impl<T: DdsType> Topic<T> {
    pub(crate) fn from_shared(shared: Arc<TopicShared<T>>) -> Self {
        Self { shared }
    }

    pub(crate) fn shared(&self) -> &Arc<TopicShared<T>> {
        &self.shared
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.shared.support.type_name()
    }

    /// Shape of the registered type.
    #[must_use]
    pub fn shape(&self) -> &TypeShape {
        self.shared.support.shape()
    }

    /// Number of DataReaders currently attached (directly or through a view).
    pub fn reader_count(&self) -> usize {
        self.shared.endpoints.reader_count()
    }

    /// Number of DataWriters currently attached.
    pub fn writer_count(&self) -> usize {
        self.shared.endpoints.writer_count()
    }
}

impl<T: DdsType> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: DdsType> std::fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name())
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// Anything a DataReader or DataWriter can be created on.
///
/// Implemented by [`Topic`] and [`ContentFilteredTopic`]. Writers always
/// publish on the related topic; readers created on a view only receive the
/// samples its filter admits.
pub trait TopicDescription<T: DdsType> {
    /// Name of the description (topic name or view name).
    fn name(&self) -> &str;

    /// Underlying topic.
    fn related_topic(&self) -> &Topic<T>;

    /// Content filter applied to readers created on this description.
    fn content_filter(&self) -> Option<&ContentFilter>;

    fn type_name(&self) -> &str {
        self.related_topic().type_name()
    }
}

impl<T: DdsType> TopicDescription<T> for Topic<T> {
    fn name(&self) -> &str {
        Topic::name(self)
    }

    fn related_topic(&self) -> &Topic<T> {
        self
    }

    fn content_filter(&self) -> Option<&ContentFilter> {
        None
    }
}

impl<T: DdsType> TopicDescription<T> for ContentFilteredTopic<T> {
    fn name(&self) -> &str {
        ContentFilteredTopic::name(self)
    }

    fn related_topic(&self) -> &Topic<T> {
        ContentFilteredTopic::related_topic(self)
    }

    fn content_filter(&self) -> Option<&ContentFilter> {
        Some(self.filter())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::dds::content_filtered_topic::ContentFilteredTopic;
use crate::dds::topic::{Topic, TopicDescription, TopicShared};
use crate::dds::type_support::{TypeRegistry, TypeSupport};
use crate::dds::reader::ReaderCore;
use crate::dds::{DataReader, DataWriter, DdsType, Error, Publisher, QoS, Result, Subscriber};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "qos-loaders")]
use crate::dds::qos::loaders::{YamlLoader, YamlQosDocument};

/// Entry of the participant's topic table. Topics and views share one
/// namespace.
enum TopicSlot {
    Topic {
        type_name: String,
        rust_type: &'static str,
        /// `Arc<TopicShared<T>>` erased to `Any`.
        shared: Arc<dyn Any + Send + Sync>,
    },
    Filtered {
        related: String,
    },
}

/// Entry point and factory for every entity.
///
/// A participant owns the type registry and the topic table. Publishers,
/// subscribers, writers and readers are created through it; all of them
/// exchange data in-process.
///
/// # Example
///
/// ```rust,ignore
/// let participant = Participant::new("factory")?;
/// participant.register_type(lot_state_support())?;
///
/// let lots = participant.create_topic::<ChocolateLotState>("ChocolateLotState", "ChocolateLotState")?;
/// let publisher = participant.create_publisher(QoS::reliable())?;
/// let writer = publisher.create_writer(&lots, QoS::reliable())?;
/// ```
pub struct Participant {
    pub(super) name: String,
    pub(super) types: TypeRegistry,
    topics: DashMap<String, TopicSlot>,
    pub(super) default_qos: QoS,
    #[cfg(feature = "qos-loaders")]
    pub(super) profiles: Option<YamlQosDocument>,
}

impl Participant {
    pub(super) fn from_parts(
        name: String,
        default_qos: QoS,
        #[cfg(feature = "qos-loaders")] profiles: Option<YamlQosDocument>,
    ) -> Self {
        Self {
            name,
            types: TypeRegistry::new(),
            topics: DashMap::new(),
            default_qos,
            #[cfg(feature = "qos-loaders")]
            profiles,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// QoS used by publishers and subscribers created without an explicit one.
    #[must_use]
    pub fn default_qos(&self) -> &QoS {
        &self.default_qos
    }

    #[must_use]
    pub fn type_registry(&self) -> &TypeRegistry {
        &self.types
    }

    /// Register a sample type. See [`TypeRegistry::register`].
    pub fn register_type<T: DdsType>(&self, support: TypeSupport<T>) -> Result<()> {
        self.types.register(support)
    }

    /// Create a topic bound to a registered type.
    ///
    /// # Errors
    ///
    /// - `UnknownType` if `type_name` is not registered
    /// - `TypeMismatch` if `T` is not the Rust type registered under
    ///   `type_name`, or a topic of that name exists with another type
    /// - `DuplicateTopic` if the name is already used by a topic of the same
    ///   type or by a content-filtered topic (use [`find_topic`](Self::find_topic))
    pub fn create_topic<T: DdsType>(&self, name: &str, type_name: &str) -> Result<Topic<T>> {
        let support = self.types.support::<T>(type_name, name)?;

        match self.topics.entry(name.to_string()) {
            Entry::Occupied(existing) => Err(match existing.get() {
                TopicSlot::Topic {
                    type_name: existing_type,
                    rust_type,
                    ..
                } if existing_type != type_name
                    || *rust_type != std::any::type_name::<T>() =>
                {
                    Error::TypeMismatch {
                        topic: name.to_string(),
                        expected: existing_type.clone(),
                        found: type_name.to_string(),
                    }
                }
                _ => Error::DuplicateTopic {
                    topic: name.to_string(),
                },
            }),
            Entry::Vacant(slot) => {
                let shared = Arc::new(TopicShared::new(name, support));
                slot.insert(TopicSlot::Topic {
                    type_name: type_name.to_string(),
                    rust_type: std::any::type_name::<T>(),
                    shared: Arc::clone(&shared) as Arc<dyn Any + Send + Sync>,
                });
                log::debug!(
                    "[PARTICIPANT] '{}' created topic '{}' (type '{}')",
                    self.name,
                    name,
                    type_name
                );
                Ok(Topic::from_shared(shared))
            }
        }
    }

    /// Look up an existing topic by name.
    ///
    /// # Errors
    ///
    /// - `UnknownTopic` if no topic has this name (content-filtered topics
    ///   are not returned)
    /// - `TypeMismatch` if the topic carries another Rust type
    pub fn find_topic<T: DdsType>(&self, name: &str) -> Result<Topic<T>> {
        let slot = self
            .topics
            .get(name)
            .ok_or_else(|| Error::UnknownTopic(name.to_string()))?;

        match slot.value() {
            TopicSlot::Topic {
                shared, rust_type, ..
            } => Arc::clone(shared)
                .downcast::<TopicShared<T>>()
                .map(Topic::from_shared)
                .map_err(|_| Error::TypeMismatch {
                    topic: name.to_string(),
                    expected: (*rust_type).to_string(),
                    found: std::any::type_name::<T>().to_string(),
                }),
            TopicSlot::Filtered { .. } => Err(Error::UnknownTopic(name.to_string())),
        }
    }

    /// Create a filtered view of `related`.
    ///
    /// # Errors
    ///
    /// - `DuplicateTopic` if `name` is already used by a topic or view
    /// - `UnknownTopic` if `related` was not created by this participant
    /// - `FilterSyntax` if the expression does not compile against the type
    pub fn create_content_filtered_topic<T: DdsType>(
        &self,
        name: &str,
        related: &Topic<T>,
        filter_expression: &str,
        expression_parameters: Vec<String>,
    ) -> Result<ContentFilteredTopic<T>> {
        self.check_owned(related)?;

        match self.topics.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::DuplicateTopic {
                topic: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                let view = ContentFilteredTopic::new(
                    name,
                    related,
                    filter_expression,
                    expression_parameters,
                )?;
                slot.insert(TopicSlot::Filtered {
                    related: related.name().to_string(),
                });
                Ok(view)
            }
        }
    }

    /// Names of every topic and view, sorted.
    pub fn topic_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Name of the topic a view was created on (`None` for plain topics).
    pub fn related_topic_name(&self, view: &str) -> Option<String> {
        self.topics.get(view).and_then(|slot| match slot.value() {
            TopicSlot::Filtered { related } => Some(related.clone()),
            TopicSlot::Topic { .. } => None,
        })
    }

    /// Create a Publisher whose writers default to `qos`.
    pub fn create_publisher(self: &Arc<Self>, qos: QoS) -> Result<Publisher> {
        qos.validate()?;
        Ok(Publisher::new(Arc::clone(self), qos))
    }

    /// Create a Subscriber whose readers default to `qos`.
    pub fn create_subscriber(self: &Arc<Self>, qos: QoS) -> Result<Subscriber> {
        qos.validate()?;
        Ok(Subscriber::new(Arc::clone(self), qos))
    }

    /// Create a DataWriter without an explicit Publisher.
    pub fn create_writer<T: DdsType>(
        &self,
        description: &impl TopicDescription<T>,
        qos: QoS,
    ) -> Result<DataWriter<T>> {
        qos.validate()?;
        let topic = description.related_topic();
        self.check_owned(topic)?;
        DataWriter::new(Arc::clone(topic.shared()), description.name(), qos)
    }

    /// Create a DataReader without an explicit Subscriber.
    ///
    /// Readers created on a [`ContentFilteredTopic`] only receive the samples
    /// its filter admits.
    pub fn create_reader<T: DdsType>(
        &self,
        description: &impl TopicDescription<T>,
        qos: QoS,
    ) -> Result<DataReader<T>> {
        qos.validate()?;
        let topic = description.related_topic();
        self.check_owned(topic)?;

        let core = Arc::new(ReaderCore::new(
            topic.name(),
            qos,
            description.content_filter().map(|filter| filter.evaluator()),
        ));
        topic.shared().endpoints().add_reader(Arc::clone(&core));
        Ok(DataReader::new(
            core,
            Arc::clone(topic.shared()),
            description.name(),
        ))
    }

    /// QoS of a named profile from the participant's QoS file.
    ///
    /// # Errors
    ///
    /// `ConfigParse` if no QoS file was loaded or the profile does not exist.
    #[cfg(feature = "qos-loaders")]
    pub fn qos_profile(&self, profile: &str) -> Result<QoS> {
        let doc = self.profiles.as_ref().ok_or_else(|| {
            Error::ConfigParse(format!(
                "participant '{}' has no QoS profiles loaded",
                self.name
            ))
        })?;
        YamlLoader::get_profile(doc, profile)
    }

    /// `topic` must be the very topic registered under its name here.
    fn check_owned<T: DdsType>(&self, topic: &Topic<T>) -> Result<()> {
        let owned = self.topics.get(topic.name()).is_some_and(|slot| match slot.value() {
            TopicSlot::Topic { shared, .. } => Arc::clone(shared)
                .downcast::<TopicShared<T>>()
                .is_ok_and(|shared| Arc::ptr_eq(&shared, topic.shared())),
            TopicSlot::Filtered { .. } => false,
        });

        if owned {
            Ok(())
        } else {
            Err(Error::UnknownTopic(topic.name().to_string()))
        }
    }
}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("name", &self.name)
            .field("topics", &self.topic_names())
            .field("default_qos", &self.default_qos)
            .finish()
    }
}

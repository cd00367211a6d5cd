// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Participant builder pattern implementation.
//!
//! The builder configures:
//! - The participant name (used in logs)
//! - The default QoS handed to publishers/subscribers created without one
//! - An optional YAML QoS file whose profiles become available through
//!   [`Participant::qos_profile`] (feature `qos-loaders`)

use super::runtime::Participant;
use crate::dds::{QoS, Result};
use std::sync::Arc;

#[cfg(feature = "qos-loaders")]
use crate::dds::qos::loaders::YamlLoader;
#[cfg(feature = "qos-loaders")]
use std::path::PathBuf;

/// Builder for configuring and creating a [`Participant`].
pub struct ParticipantBuilder {
    name: String,
    default_qos: Option<QoS>,
    #[cfg(feature = "qos-loaders")]
    qos_file: Option<PathBuf>,
}

impl Participant {
    /// Create a new participant with default settings.
    ///
    /// This is a convenience method equivalent to:
    /// ```ignore
    /// Participant::builder(name).build()
    /// ```
    pub fn new(name: &str) -> Result<Arc<Self>> {
        Self::builder(name).build()
    }

    /// Create a new participant builder.
    ///
    /// # Example
    /// ```ignore
    /// let participant = Participant::builder("factory")
    ///     .qos_file("qos_profiles.yaml")
    ///     .build()?;
    /// ```
    pub fn builder(name: &str) -> ParticipantBuilder {
        ParticipantBuilder {
            name: name.to_string(),
            default_qos: None,
            #[cfg(feature = "qos-loaders")]
            qos_file: None,
        }
    }
}

impl ParticipantBuilder {
    /// Default QoS of the participant.
    ///
    /// Takes precedence over the default profile of a QoS file.
    #[must_use]
    pub fn default_qos(mut self, qos: QoS) -> Self {
        self.default_qos = Some(qos);
        self
    }

    #[cfg(feature = "qos-loaders")]
    /// Load QoS profiles from a YAML file at build time.
    ///
    /// Unless [`default_qos`](Self::default_qos) is set, the file's default
    /// profile becomes the participant's default QoS.
    #[must_use]
    pub fn qos_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.qos_file = Some(path.into());
        self
    }

    /// Build the participant.
    ///
    /// # Errors
    ///
    /// - `InvalidQos` if the default QoS does not validate
    /// - `ConfigFileNotFound` / `ConfigParse` if the QoS file cannot be used
    pub fn build(self) -> Result<Arc<Participant>> {
        #[cfg(feature = "qos-loaders")]
        let profiles = match &self.qos_file {
            Some(path) => Some(YamlLoader::load_from_file(path)?),
            None => None,
        };

        #[cfg(feature = "qos-loaders")]
        let default_qos = match (self.default_qos, &profiles) {
            (Some(qos), _) => qos,
            (None, Some(doc)) => YamlLoader::get_default_profile(doc)?,
            (None, None) => QoS::default(),
        };
        #[cfg(not(feature = "qos-loaders"))]
        let default_qos = self.default_qos.unwrap_or_default();

        default_qos.validate()?;

        log::debug!(
            "[PARTICIPANT] '{}' ready (default {:?}, {:?})",
            self.name,
            default_qos.reliability,
            default_qos.history
        );

        Ok(Arc::new(Participant::from_parts(
            self.name,
            default_qos,
            #[cfg(feature = "qos-loaders")]
            profiles,
        )))
    }
}

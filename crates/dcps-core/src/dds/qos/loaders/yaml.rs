// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML QoS profiles.
//!
//! A document holds named profiles and optionally names the one to use as
//! participant default. Keywords are matched case-insensitively; every
//! section is optional and anything omitted keeps its `QoS::default()` value.
//!
//! ```yaml
//! default_profile: tempering_line
//! profiles:
//!   tempering_line:
//!     reliability: RELIABLE
//!     history: { kind: KEEP_LAST, depth: 10 }
//!   lot_tracking:
//!     reliability: RELIABLE
//!     history: { kind: KEEP_ALL }
//!     resource_limits: { max_samples: 256 }
//!     writer_data_lifecycle: { autodispose_unregistered_instances: false }
//!     delivery: { kind: ASYNCHRONOUS, queue_depth: 64 }
//!     max_blocking_time_ms: 50
//! ```

use crate::config::{DEFAULT_HISTORY_DEPTH, DEFAULT_SEND_QUEUE_DEPTH};
use crate::dds::qos::{Delivery, History, QoS, Reliability, WriterDataLifecycle};
use crate::dds::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

/// Entry points for reading profile documents.
pub struct YamlLoader;

#[derive(Debug, Default, Deserialize)]
pub struct YamlQosDocument {
    #[serde(default)]
    pub profiles: BTreeMap<String, YamlQosProfile>,
    #[serde(default)]
    pub default_profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct YamlQosProfile {
    pub reliability: Option<String>,
    pub history: Option<HistorySection>,
    pub resource_limits: Option<ResourceLimitsSection>,
    pub writer_data_lifecycle: Option<LifecycleSection>,
    pub delivery: Option<DeliverySection>,
    pub max_blocking_time_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct HistorySection {
    pub kind: String,
    #[serde(default = "history_depth")]
    pub depth: u32,
}

#[derive(Debug, Deserialize)]
pub struct ResourceLimitsSection {
    pub max_samples: usize,
}

#[derive(Debug, Deserialize)]
pub struct LifecycleSection {
    #[serde(default = "enabled")]
    pub autodispose_unregistered_instances: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeliverySection {
    pub kind: String,
    #[serde(default = "queue_depth")]
    pub queue_depth: usize,
}

fn history_depth() -> u32 {
    DEFAULT_HISTORY_DEPTH
}

fn queue_depth() -> usize {
    DEFAULT_SEND_QUEUE_DEPTH
}

fn enabled() -> bool {
    true
}

/// Match `value` against `choices` ignoring ASCII case.
fn keyword<T: Copy>(what: &str, value: &str, choices: &[(&str, T)]) -> Result<T> {
    choices
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(value))
        .map(|&(_, choice)| choice)
        .ok_or_else(|| Error::ConfigParse(format!("Invalid {}: {}", what, value)))
}

#[derive(Clone, Copy)]
enum HistoryKind {
    KeepLast,
    KeepAll,
}

#[derive(Clone, Copy)]
enum DeliveryKind {
    Synchronous,
    Asynchronous,
}

impl YamlQosProfile {
    /// Overlay this profile on `QoS::default()` and validate the result.
    pub fn to_qos(&self) -> Result<QoS> {
        let mut qos = QoS::default();

        if let Some(value) = &self.reliability {
            qos.reliability = keyword(
                "reliability",
                value,
                &[
                    ("RELIABLE", Reliability::Reliable),
                    ("BEST_EFFORT", Reliability::BestEffort),
                ],
            )?;
        }
        if let Some(history) = &self.history {
            let kind = keyword(
                "history kind",
                &history.kind,
                &[
                    ("KEEP_LAST", HistoryKind::KeepLast),
                    ("KEEP_ALL", HistoryKind::KeepAll),
                ],
            )?;
            qos.history = match kind {
                HistoryKind::KeepLast => History::KeepLast(history.depth),
                HistoryKind::KeepAll => History::KeepAll,
            };
        }
        if let Some(limits) = &self.resource_limits {
            qos.resource_limits.max_samples = limits.max_samples;
        }
        if let Some(lifecycle) = &self.writer_data_lifecycle {
            qos.writer_data_lifecycle = WriterDataLifecycle {
                autodispose_unregistered_instances: lifecycle.autodispose_unregistered_instances,
            };
        }
        if let Some(delivery) = &self.delivery {
            let kind = keyword(
                "delivery kind",
                &delivery.kind,
                &[
                    ("SYNCHRONOUS", DeliveryKind::Synchronous),
                    ("ASYNCHRONOUS", DeliveryKind::Asynchronous),
                ],
            )?;
            qos.delivery = match kind {
                DeliveryKind::Synchronous => Delivery::Synchronous,
                DeliveryKind::Asynchronous => Delivery::Asynchronous {
                    queue_depth: delivery.queue_depth,
                },
            };
        }
        if let Some(ms) = self.max_blocking_time_ms {
            qos.max_blocking_time = Duration::from_millis(ms);
        }

        qos.validate()?;
        Ok(qos)
    }
}

impl YamlLoader {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<YamlQosDocument> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ConfigFileNotFound(path.display().to_string()),
            _ => Error::from(e),
        })?;
        log::debug!("[QOS-YAML] loading profiles from {}", path.display());
        Self::parse_yaml(&text)
    }

    pub fn parse_yaml(text: &str) -> Result<YamlQosDocument> {
        serde_yaml::from_str(text).map_err(|e| Error::ConfigParse(format!("malformed YAML: {}", e)))
    }

    pub fn get_profile(doc: &YamlQosDocument, name: &str) -> Result<QoS> {
        doc.profiles
            .get(name)
            .ok_or_else(|| Error::ConfigParse(format!("no QoS profile named '{}'", name)))?
            .to_qos()
    }

    /// The named default, else the first profile by name, else `QoS::default()`.
    pub fn get_default_profile(doc: &YamlQosDocument) -> Result<QoS> {
        match (&doc.default_profile, doc.profiles.values().next()) {
            (Some(name), _) => Self::get_profile(doc, name),
            (None, Some(first)) => first.to_qos(),
            (None, None) => Ok(QoS::default()),
        }
    }

    pub fn profile_to_qos(profile: &YamlQosProfile) -> Result<QoS> {
        profile.to_qos()
    }

    /// Read `path` and resolve one profile; `None` selects the default.
    pub fn load_qos<P: AsRef<Path>>(path: P, profile_name: Option<&str>) -> Result<QoS> {
        let doc = Self::load_from_file(path)?;
        profile_name.map_or_else(
            || Self::get_default_profile(&doc),
            |name| Self::get_profile(&doc, name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn profile(doc: &str, name: &str) -> Result<QoS> {
        let doc = YamlLoader::parse_yaml(doc).expect("YAML parse should succeed");
        YamlLoader::get_profile(&doc, name)
    }

    #[test]
    fn test_unset_sections_keep_defaults() {
        let qos = profile("profiles:\n  sensors:\n    reliability: RELIABLE\n", "sensors")
            .expect("profile should resolve");
        assert_eq!(
            qos,
            QoS {
                reliability: Reliability::Reliable,
                ..QoS::default()
            }
        );
    }

    #[test]
    fn test_every_section_applied() {
        let doc = YamlLoader::parse_yaml(
            "default_profile: lot_tracking
profiles:
  lot_tracking:
    reliability: RELIABLE
    history: { kind: KEEP_ALL }
    resource_limits: { max_samples: 256 }
    writer_data_lifecycle: { autodispose_unregistered_instances: false }
    delivery: { kind: ASYNCHRONOUS, queue_depth: 64 }
    max_blocking_time_ms: 50
",
        )
        .expect("YAML parse should succeed");
        let qos = YamlLoader::get_default_profile(&doc).expect("default profile should resolve");

        assert_eq!(qos.reliability, Reliability::Reliable);
        assert_eq!(qos.history, History::KeepAll);
        assert_eq!(qos.resource_limits.max_samples, 256);
        assert!(!qos.writer_data_lifecycle.is_auto_dispose());
        assert_eq!(qos.delivery, Delivery::Asynchronous { queue_depth: 64 });
        assert_eq!(qos.max_blocking_time, Duration::from_millis(50));
    }

    #[test]
    fn test_keywords_ignore_case_and_depth_defaults() {
        let qos = profile(
            "profiles:\n  a:\n    reliability: reliable\n    history: { kind: Keep_Last }\n    delivery: { kind: asynchronous }\n",
            "a",
        )
        .expect("profile should resolve");
        assert_eq!(qos.history, History::KeepLast(DEFAULT_HISTORY_DEPTH));
        assert_eq!(
            qos.delivery,
            Delivery::Asynchronous {
                queue_depth: DEFAULT_SEND_QUEUE_DEPTH
            }
        );
    }

    #[test]
    fn test_default_profile_fallbacks() {
        let empty = YamlLoader::parse_yaml("profiles: {}").expect("YAML parse should succeed");
        assert_eq!(
            YamlLoader::get_default_profile(&empty).expect("default should resolve"),
            QoS::default()
        );

        let unnamed = YamlLoader::parse_yaml(
            "profiles:\n  zeta:\n    reliability: BEST_EFFORT\n  alpha:\n    reliability: RELIABLE\n",
        )
        .expect("YAML parse should succeed");
        assert_eq!(
            YamlLoader::get_default_profile(&unnamed)
                .expect("default should resolve")
                .reliability,
            Reliability::Reliable
        );
    }

    #[test]
    fn test_rejected_documents() {
        let cases = [
            ("profiles:\n  p:\n    reliability: SOMETIMES\n", "p"),
            ("profiles:\n  p:\n    delivery: { kind: LATER }\n", "p"),
            ("profiles: {}", "missing"),
        ];
        for (doc, name) in cases {
            assert!(
                matches!(profile(doc, name), Err(Error::ConfigParse(_))),
                "{doc:?} should be rejected"
            );
        }
        assert!(matches!(
            profile("profiles:\n  p:\n    history: { kind: KEEP_LAST, depth: 0 }\n", "p"),
            Err(Error::InvalidQos(_))
        ));
        assert!(matches!(
            YamlLoader::parse_yaml("profiles: [unclosed"),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            YamlLoader::parse_yaml("profiles:\n  p:\n    durability: VOLATILE\n"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file creation should succeed");
        writeln!(
            file,
            "profiles:\n  line:\n    reliability: RELIABLE\n    history:\n      kind: KEEP_LAST\n      depth: 3"
        )
        .expect("write should succeed");

        let qos = YamlLoader::load_qos(file.path(), Some("line")).expect("load should succeed");
        assert_eq!(qos.history, History::KeepLast(3));
        let qos = QoS::load_yaml(file.path(), None).expect("load should succeed");
        assert_eq!(qos.reliability, Reliability::Reliable);

        assert!(matches!(
            YamlLoader::load_from_file("/nonexistent/qos_profiles.yaml"),
            Err(Error::ConfigFileNotFound(_))
        ));
    }
}

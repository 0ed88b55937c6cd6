//! Declarative connector specification.
//!
//! A `ConnectorSpec` is constructed once per test case and is immutable once
//! a command has been rendered from it. Map-valued fields use `BTreeMap` so
//! their JSON encoding is deterministic.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Delivery semantics mode a connector operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessingGuarantee {
    AtMostOnce,
    AtLeastOnce,
    EffectivelyOnce,
}

impl ProcessingGuarantee {
    /// Token the admin tool accepts for `--processingGuarantees`.
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            ProcessingGuarantee::AtMostOnce => "ATMOST_ONCE",
            ProcessingGuarantee::AtLeastOnce => "ATLEAST_ONCE",
            ProcessingGuarantee::EffectivelyOnce => "EFFECTIVELY_ONCE",
        }
    }
}

/// Packaging runtime for the deployed connector code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeKind {
    /// Packaged archive deployed from a fixed path
    #[default]
    Compiled,
    /// Source tree deployed from a base directory, optionally suffixed with a code file
    Interpreted,
}

/// Windowing parameters.
///
/// All fields are optional, but a sliding window (either interval field set)
/// requires a window length as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    #[serde(default)]
    pub length_count: Option<u32>,

    #[serde(default)]
    pub length_duration_ms: Option<u64>,

    #[serde(default)]
    pub sliding_interval_count: Option<u32>,

    #[serde(default)]
    pub sliding_interval_duration_ms: Option<u64>,
}

impl WindowSpec {
    pub fn is_empty(&self) -> bool {
        self.length_count.is_none()
            && self.length_duration_ms.is_none()
            && self.sliding_interval_count.is_none()
            && self.sliding_interval_duration_ms.is_none()
    }

    fn has_length(&self) -> bool {
        self.length_count.is_some() || self.length_duration_ms.is_some()
    }

    fn has_sliding_interval(&self) -> bool {
        self.sliding_interval_count.is_some() || self.sliding_interval_duration_ms.is_some()
    }
}

/// Declarative description of a deployed function or connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Owning tenant
    #[serde(default = "default_tenant")]
    pub tenant: String,

    /// Namespace within the tenant
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Function/connector name
    #[serde(default)]
    pub name: Option<String>,

    /// Implementation class reference
    #[serde(default)]
    pub class_name: Option<String>,

    /// Single input topic
    #[serde(default)]
    pub input_topic: Option<String>,

    /// Per-topic serialization class mapping, exclusive with `input_topic`
    /// for source-style specs (the command generator does not enforce this)
    #[serde(default)]
    pub serde_inputs: BTreeMap<String, String>,

    /// Output topic
    #[serde(default)]
    pub output_topic: Option<String>,

    /// Log topic
    #[serde(default)]
    pub log_topic: Option<String>,

    /// Serialization class for the output topic
    #[serde(default)]
    pub output_serde_class: Option<String>,

    /// Processing guarantee mode
    #[serde(default)]
    pub processing_guarantee: Option<ProcessingGuarantee>,

    /// Instance parallelism, must be positive when set
    #[serde(default)]
    pub parallelism: Option<u32>,

    /// Windowing parameters
    #[serde(default)]
    pub window: WindowSpec,

    /// Free-form user configuration
    #[serde(default)]
    pub user_config: BTreeMap<String, String>,

    /// Packaging runtime
    #[serde(default)]
    pub runtime: RuntimeKind,
}

fn default_tenant() -> String {
    "public".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for ConnectorSpec {
    fn default() -> Self {
        Self {
            tenant: default_tenant(),
            namespace: default_namespace(),
            name: None,
            class_name: None,
            input_topic: None,
            serde_inputs: BTreeMap::new(),
            output_topic: None,
            log_topic: None,
            output_serde_class: None,
            processing_guarantee: None,
            parallelism: None,
            window: WindowSpec::default(),
            user_config: BTreeMap::new(),
            runtime: RuntimeKind::default(),
        }
    }
}

impl ConnectorSpec {
    /// Spec for a function reading a single input topic.
    pub fn for_input_topic(topic: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            input_topic: Some(topic.into()),
            class_name: Some(class_name.into()),
            ..Default::default()
        }
    }

    /// Spec for a function reading topics through a per-topic serde mapping.
    pub fn for_serde_inputs(
        serde_inputs: BTreeMap<String, String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            serde_inputs,
            class_name: Some(class_name.into()),
            ..Default::default()
        }
    }

    /// Spec identifying an already-deployed function, for delete and trigger.
    pub fn for_function(
        tenant: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            namespace: namespace.into(),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Load a spec from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Validate general constraints: positive parallelism, window coherence.
    pub fn validate(&self) -> Result<()> {
        if let Some(parallelism) = self.parallelism {
            if parallelism == 0 {
                return Err(Error::Config("parallelism must be > 0".to_string()));
            }
        }

        if self.window.has_sliding_interval() && !self.window.has_length() {
            return Err(Error::Config(
                "a sliding window requires a window length as well as a slide interval"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Validate a source-style spec: exactly one input binding must be set.
    pub fn validate_source(&self) -> Result<()> {
        self.validate()?;

        let single = self.input_topic.is_some();
        let mapped = !self.serde_inputs.is_empty();
        if single && mapped {
            return Err(Error::Config(
                "input_topic and serde_inputs are mutually exclusive for a source spec"
                    .to_string(),
            ));
        }
        if !single && !mapped {
            return Err(Error::Config(
                "a source spec requires either input_topic or serde_inputs".to_string(),
            ));
        }

        Ok(())
    }
}

//! Connector Conformance Core Library
//!
//! This crate provides the building blocks for validating that a connector
//! deployed on a pub/sub messaging platform correctly moves records between
//! the platform and an external system: a declarative connector spec with
//! admin-command rendering, a phase protocol for conformance runs, and
//! adapters that manage the lifecycle of the external system under test.

pub mod adapters;
pub mod command;
pub mod config;
pub mod error;
pub mod naming;
pub mod records;
pub mod spec;
pub mod tester;

pub use config::{AdminEndpoint, DuplicatePolicy, HarnessConfig};
pub use error::{Error, Result, VerificationFailure};
pub use records::RecordSet;
pub use spec::{ConnectorSpec, ProcessingGuarantee, RuntimeKind, WindowSpec};
pub use tester::{
    ConformanceReport, ConformanceTest, ExternalSystem, Phase, PhaseOutcome, PlatformConsumer,
    SystemHandle,
};

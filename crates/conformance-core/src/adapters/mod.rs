//! External system adapters.

pub mod kafka;

pub use kafka::{KafkaLoopbackConsumer, KafkaSourceAdapter};

//! Ingestion: the contract toward external event producers.
//!
//! A producer implements [`EventSource`]; the [`IngestionLoop`] polls it on a
//! fixed period and feeds each batch to the view, followed by an eviction
//! pass. The loop is cancelled through its [`IngestionHandle`].

pub mod runner;
pub mod source;

// Re-export commonly used types
pub use runner::{IngestionHandle, IngestionLoop};
pub use source::{
    ChannelSource, Clock, EventSource, RuntimeClock, SystemClock, DEFAULT_CHANNEL_CAPACITY,
};

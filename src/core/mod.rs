//! Core functionality for the activity heat-map.
//!
//! This module contains:
//! - The validated event type
//! - The pattern store with eviction and change notification
//! - Time and intensity scales
//! - Hit-testing of pointer positions
//! - Reliability checks for events

pub mod event;
pub mod scale;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use event::{ActivityEvent, IntoActivityEvent, InvalidEventError, RawActivityEvent};
pub use hit_test::{event_at, hit_test, HitResult};
pub use scale::{IntensityScale, Scales, TimeScale};
pub use store::{PatternStore, Snapshot, SubscriptionId};
pub use validation::{PatternValidator, ValidationResult};

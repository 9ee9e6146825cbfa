//! Event distribution for presentation layers.
//!
//! The coordinator publishes a `SyncEvent` whenever state a presentation
//! layer renders has changed. Subscribers pull the new state from the
//! coordinator; events carry only enough to decide whether to.

pub mod bus;

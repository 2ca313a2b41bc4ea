//! Discrete-event simulator.
//!
//! Simulated time only moves when the earliest pending completion is popped
//! from the event queue. After every completion the ready list is handed to
//! the active algorithm and its order is matched against idle processors.

mod core;
mod events;
mod timeline;

pub use core::{SimulationError, Simulator};
pub use events::{CompletionEvent, EventQueue};
pub use timeline::{Timeline, TimelineEntry, TimelineSink};

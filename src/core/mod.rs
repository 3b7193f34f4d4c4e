pub mod planner;
pub mod prompt;

pub use planner::TripPlanner;
pub use prompt::{itinerary_system_instruction, PROBE_PROMPT};

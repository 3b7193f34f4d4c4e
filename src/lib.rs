//! trip-planner-rs: turns a natural-language trip description into a
//! normalized multi-day itinerary using Gemini.
//!
//! The pipeline is: generation call (retried with backoff while the model is
//! overloaded) → JSON extraction from the raw reply → normalization into a
//! shape where every field is always present.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_planner_rs::{PlannerConfig, TripPlanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlannerConfig::from_env()?;
//!     let planner = TripPlanner::from_config(&config)?;
//!
//!     let itinerary = planner.plan_trip_text("5 days in Tokyo, foodie style").await?;
//!     println!("{}", serde_json::to_string_pretty(&itinerary)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub mod server;
pub mod services;
pub mod types;

pub use config::{PlannerConfig, ServerConfig};
pub use crate::core::{itinerary_system_instruction, TripPlanner};
pub use error::{PlannerError, Result};
pub use schemas::{itinerary_function, FunctionSchema};
pub use services::{
    extract::extract_json_object,
    gemini_client::GeminiClient,
    generation::GenerationClient,
    normalize::normalize_itinerary,
    retry::{is_overload_error, RetryController, RetryPolicy, Sleeper, TokioSleeper},
};
pub use types::{DayPlan, ImageAttachment, Itinerary, ItineraryRequest};

#[cfg(feature = "cli")]
pub mod cli;

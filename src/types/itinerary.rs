use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fallback destination when the model leaves it out.
pub const UNKNOWN_DESTINATION: &str = "Unknown destination";
/// Fallback trip style when the model leaves it out.
pub const DEFAULT_TRIP_STYLE: &str = "Leisure";

/// Structured travel itinerary returned to the browser client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Itinerary {
    /// Primary destination or region
    pub destination: String,
    /// Trip vibe / style (e.g., romantic, adventure, foodie)
    pub trip_style: String,
    /// Total number of days
    pub total_days: u32,
    /// Day-by-day plan in chronological order
    pub daily_itinerary: Vec<DayPlan>,
}

/// One day's entry within an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    /// 1-based day counter within the itinerary
    pub day: u32,
    /// City the traveler spends this day in
    pub city: String,
    /// Activities or attractions for the day in chronological order
    pub activities: Vec<String>,
    /// Places or dishes worth eating
    #[serde(default)]
    pub food_recommendations: Vec<String>,
    /// Practical advice for the day
    #[serde(default)]
    pub travel_tips: Vec<String>,
}

impl Itinerary {
    /// Number of planned days actually present.
    pub fn planned_days(&self) -> usize {
        self.daily_itinerary.len()
    }
}

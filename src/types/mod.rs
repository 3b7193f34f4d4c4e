pub mod itinerary;
pub mod request;

pub use itinerary::{DayPlan, Itinerary, DEFAULT_TRIP_STYLE, UNKNOWN_DESTINATION};
pub use request::{ImageAttachment, ItineraryRequest, DEFAULT_IMAGE_MIME};

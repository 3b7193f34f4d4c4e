pub mod schema;

pub use schema::{itinerary_function, FunctionSchema, ITINERARY_FUNCTION_NAME};

pub mod extract;
pub mod gemini_client;
pub mod generation;
pub mod normalize;
pub mod retry;

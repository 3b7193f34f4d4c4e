use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::Result, types::ItineraryRequest};

/// A remote model that turns an itinerary request into raw text.
///
/// The planner only sees this trait, so tests can hand it a scripted fake.
#[async_trait]
pub trait GenerationClient: Send + Sync + Debug {
    /// Fails with a configuration error when the client cannot make calls at all.
    /// Checked before any network traffic.
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    /// One generation call. Any provider failure surfaces as
    /// [`PlannerError::Upstream`](crate::PlannerError::Upstream) carrying the provider message.
    async fn generate(&self, request: &ItineraryRequest) -> Result<String>;
}

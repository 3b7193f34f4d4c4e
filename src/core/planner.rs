use std::{sync::Arc, time::Instant};

use tracing::{debug, info};

use crate::{
    config::PlannerConfig,
    error::{PlannerError, Result},
    services::{
        extract::extract_json_object,
        gemini_client::GeminiClient,
        generation::GenerationClient,
        normalize::normalize_itinerary,
        retry::{RetryController, RetryPolicy, Sleeper},
    },
    types::{Itinerary, ItineraryRequest},
};

/// How much of an unparseable model reply is quoted back in the error.
const MALFORMED_PREVIEW_CHARS: usize = 200;

/// Composes generation, retry, extraction and normalization into one call.
#[derive(Clone, Debug)]
pub struct TripPlanner {
    client: Arc<dyn GenerationClient>,
    retry: RetryController,
}

impl TripPlanner {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self {
            client,
            retry: RetryController::default(),
        }
    }

    /// Planner backed by Gemini, configured from `config`.
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        let client = GeminiClient::new(config.api_key.clone(), config.request_timeout)?
            .with_base_url(config.base_url.clone())
            .with_model(config.model.clone());

        Ok(Self::new(Arc::new(client)).with_retry_policy(config.retry))
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = RetryController::new(policy);
        self
    }

    pub fn with_retry_controller(mut self, retry: RetryController) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.retry = self.retry.with_sleeper(sleeper);
        self
    }

    /// Whether the underlying client has what it needs to make calls.
    pub fn is_configured(&self) -> bool {
        self.client.ensure_configured().is_ok()
    }

    /// Plan a trip. Either a fully normalized itinerary or an error; never a
    /// partial result.
    pub async fn plan_trip(&self, request: ItineraryRequest) -> Result<Itinerary> {
        self.client.ensure_configured()?;

        let started = Instant::now();
        let client = &self.client;
        let raw = self
            .retry
            .run(|| {
                let request = &request;
                async move { client.generate(request).await }
            })
            .await?;

        debug!(
            target: "trip_planner::planner",
            chars = raw.len(),
            "received model output"
        );

        let parsed = extract_json_object(&raw)
            .ok_or_else(|| PlannerError::MalformedResponse(preview(&raw)))?;
        let itinerary = normalize_itinerary(&parsed);

        info!(
            target: "trip_planner::planner",
            destination = %itinerary.destination,
            total_days = itinerary.total_days,
            planned_days = itinerary.planned_days(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "itinerary planned"
        );

        Ok(itinerary)
    }

    /// Text-only convenience over [`TripPlanner::plan_trip`].
    pub async fn plan_trip_text(&self, prompt: &str) -> Result<Itinerary> {
        self.plan_trip(ItineraryRequest::new(prompt)?).await
    }
}

fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "empty model output".to_string();
    }

    let mut preview: String = trimmed.chars().take(MALFORMED_PREVIEW_CHARS).collect();
    if trimmed.chars().count() > MALFORMED_PREVIEW_CHARS {
        preview.push('…');
    }
    preview
}

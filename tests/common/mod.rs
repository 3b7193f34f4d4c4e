#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use trip_planner_rs::{
    GenerationClient, ItineraryRequest, PlannerError, Result, RetryPolicy, Sleeper, TripPlanner,
};

pub fn overloaded() -> PlannerError {
    PlannerError::Upstream(
        "HTTP 503 UNAVAILABLE: The model is overloaded. Please try again later.".to_string(),
    )
}

/// Generation client that replays a fixed script of replies.
#[derive(Debug)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String>>>,
    seen: Mutex<Vec<ItineraryRequest>>,
    configured: bool,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ItineraryRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn ensure_configured(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else {
            Err(PlannerError::Configuration(
                "GEMINI_API_KEY is required".to_string(),
            ))
        }
    }

    async fn generate(&self, request: &ItineraryRequest) -> Result<String> {
        self.seen.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PlannerError::Upstream("script exhausted".to_string())))
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Planner over `client` with the default retry policy and a recording sleeper.
pub fn planner_with(
    client: Arc<ScriptedClient>,
) -> (TripPlanner, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let planner = TripPlanner::new(client)
        .with_retry_policy(RetryPolicy::default())
        .with_sleeper(sleeper.clone());
    (planner, sleeper)
}

pub const TOKYO_REPLY: &str = r#"```json
{
  "destination": "Tokyo, Japan",
  "trip_style": "Foodie",
  "total_days": 5,
  "daily_itinerary": [
    { "day": 1, "city": "Tokyo", "activities": ["Tsukiji Outer Market"], "food_recommendations": ["Sushi Dai"], "travel_tips": ["Get a Suica card"] },
    { "day": 2, "city": "Tokyo", "activities": "Ramen crawl in Shinjuku" },
    { "day": 3, "city": "Yokohama", "activities": ["Cup Noodles Museum"], "food_recommendations": "Chinatown dumplings" },
    { "day": 4, "city": "Tokyo", "activities": ["Depachika tasting"], "travel_tips": null },
    { "day": 5, "city": "Tokyo", "activities": ["Omakase dinner"] }
  ]
}
```"#;

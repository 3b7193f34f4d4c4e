use std::sync::OnceLock;

use crate::schemas::itinerary_function;

const PLANNER_PREAMBLE: &str = "You are an expert travel planner. Use the user's natural-language prompt and the provided image aesthetics to craft a travel itinerary.";

/// Prompt used by the connectivity probe.
pub const PROBE_PROMPT: &str =
    r#"Respond with JSON only: {"test": "success", "message": "Gemini is working"}"#;

/// Fixed system instruction sent with every itinerary request.
///
/// Demands one bare JSON object and embeds the advisory `generate_itinerary`
/// schema so the model knows the field names.
pub fn itinerary_system_instruction() -> &'static str {
    static INSTRUCTION: OnceLock<String> = OnceLock::new();
    INSTRUCTION.get_or_init(|| {
        let function = itinerary_function();
        let schema = serde_json::to_string_pretty(function.parameters())
            .unwrap_or_else(|_| function.parameters().to_string());

        format!(
            "{PLANNER_PREAMBLE} Always produce a single JSON object that matches the {name} schema exactly (destination, trip_style, total_days, daily_itinerary). Do NOT include text, explanations, or markdown outside the JSON. The JSON must be parseable.\n\n{name} schema:\n{schema}",
            name = function.name(),
        )
    })
}

use serde_json::{Map, Value};

use crate::types::{DayPlan, Itinerary, DEFAULT_TRIP_STYLE, UNKNOWN_DESTINATION};

/// Coerce a loosely-shaped model object into a fully populated [`Itinerary`].
///
/// Never fails: every missing or mistyped field takes its default. Days keep
/// the order the model gave them.
pub fn normalize_itinerary(raw: &Map<String, Value>) -> Itinerary {
    let destination =
        text_field(raw.get("destination")).unwrap_or_else(|| UNKNOWN_DESTINATION.to_string());
    let trip_style =
        text_field(raw.get("trip_style")).unwrap_or_else(|| DEFAULT_TRIP_STYLE.to_string());

    let days: &[Value] = raw
        .get("daily_itinerary")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let total_days = positive_count(raw.get("total_days")).unwrap_or(days.len() as u32);

    let daily_itinerary = days
        .iter()
        .enumerate()
        .map(|(idx, entry)| normalize_day(entry, idx, &destination))
        .collect();

    Itinerary {
        destination,
        trip_style,
        total_days,
        daily_itinerary,
    }
}

fn normalize_day(entry: &Value, idx: usize, destination: &str) -> DayPlan {
    let empty = Map::new();
    let fields = entry.as_object().unwrap_or(&empty);

    let day = fields
        .get("day")
        .and_then(day_number)
        .unwrap_or(idx as u32 + 1);
    let city = text_field(fields.get("city")).unwrap_or_else(|| default_city(destination, day));

    DayPlan {
        day,
        city,
        activities: string_list(fields.get("activities")),
        food_recommendations: string_list(fields.get("food_recommendations")),
        travel_tips: string_list(fields.get("travel_tips")),
    }
}

fn default_city(destination: &str, day: u32) -> String {
    if destination.is_empty() {
        format!("Day {day}")
    } else {
        destination.to_string()
    }
}

/// Truthy strings as-is; truthy numbers and booleans rendered; anything else is absent.
fn text_field(value: Option<&Value>) -> Option<String> {
    let value = value.filter(|value| is_truthy(value))?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Any non-negative JSON number, truncated to an integer.
fn day_number(value: &Value) -> Option<u32> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(n) = number.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = number.as_f64()?;
    (f.is_finite() && f >= 0.0 && f <= u32::MAX as f64).then(|| f.trunc() as u32)
}

/// Like [`day_number`], but zero counts as absent.
fn positive_count(value: Option<&Value>) -> Option<u32> {
    value.and_then(day_number).filter(|n| *n > 0)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(list_item).collect(),
        Some(scalar) if is_truthy(scalar) => list_item(scalar).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn list_item(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

use auth_oauth::AuthenticatedClient;
use axum::{Extension, Json};
use chrono::{Days, NaiveDate, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const SUMMARIES: [&str; 10] = [
    "Freezing", "Bracing", "Chilly", "Cool", "Mild", "Warm", "Balmy", "Hot", "Sweltering", "Scorching",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: Option<String>,
}

impl WeatherForecast {
    pub fn new(date: NaiveDate, temperature_c: i32, summary: Option<String>) -> Self {
        Self {
            date,
            temperature_c,
            temperature_f: fahrenheit(temperature_c),
            summary,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn fahrenheit(celsius: i32) -> i32 {
    32 + (f64::from(celsius) / 0.5556) as i32
}

/// `count` forecasts starting tomorrow
pub fn generate_forecasts(count: u64) -> Vec<WeatherForecast> {
    let mut rng = rand::thread_rng();
    let today = Utc::now().date_naive();

    (1..=count)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .map(|date| {
            let summary = SUMMARIES.choose(&mut rng).map(|s| (*s).to_string());
            WeatherForecast::new(date, rng.gen_range(-20..55), summary)
        })
        .collect()
}

/// `GET /WeatherForecast/Get1`
pub async fn get1() -> Json<Vec<WeatherForecast>> {
    Json(generate_forecasts(5))
}

/// `GET /WeatherForecast/Get2`
pub async fn get2() -> Json<Vec<WeatherForecast>> {
    Json(generate_forecasts(7))
}

/// `GET /WeatherForecast/GetSecured`, behind the bearer guard
pub async fn get_secured(Extension(client): Extension<AuthenticatedClient>) -> Json<Vec<WeatherForecast>> {
    tracing::info!(subject = %client.subject, "Serving secured forecast");
    Json(generate_forecasts(10))
}

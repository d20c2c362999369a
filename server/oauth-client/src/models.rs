use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Forecast as served by the issuer's resource endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Result of `GET /Client/test-public`
#[derive(Debug, Serialize)]
pub struct PublicCallResult {
    pub source: String,
    pub data: Vec<WeatherForecast>,
}

/// Result of `GET /Client/test-secured`
#[derive(Debug, Serialize)]
pub struct SecuredCallResult {
    pub source: String,
    /// Redacted prefix of the bearer token that was sent
    pub token_used: String,
    pub data: Vec<WeatherForecast>,
}

/// One step of the OAuth proof run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub step: u8,
    pub action: String,
    pub expected_result: String,
    pub actual_result: String,
    pub success: bool,
}

impl TestStep {
    pub fn new(step: u8, action: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self {
            step,
            action: action.into(),
            expected_result: expected_result.into(),
            actual_result: String::new(),
            success: false,
        }
    }

    pub fn passed(&mut self, actual: impl Into<String>) {
        self.actual_result = actual.into();
        self.success = true;
    }

    pub fn failed(&mut self, actual: impl Into<String>) {
        self.actual_result = actual.into();
        self.success = false;
    }
}

/// Report returned by `GET /Client/prove-oauth-works`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTestResult {
    pub test: String,
    pub description: String,
    pub steps: Vec<TestStep>,
    pub conclusion: String,
}

impl OAuthTestResult {
    pub fn all_passed(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.success)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_step_wire_format() {
        let mut step = TestStep::new(1, "Attempt", "Failure");
        step.passed("Rejected");

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step"], 1);
        assert_eq!(json["expectedResult"], "Failure");
        assert_eq!(json["actualResult"], "Rejected");
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_all_passed() {
        let mut result = OAuthTestResult {
            test: "t".to_string(),
            description: "d".to_string(),
            steps: vec![TestStep::new(1, "a", "e"), TestStep::new(2, "a", "e")],
            conclusion: String::new(),
        };
        assert!(!result.all_passed());

        for step in &mut result.steps {
            step.passed("ok");
        }
        assert!(result.all_passed());

        result.steps.clear();
        assert!(!result.all_passed());
    }

    #[test]
    fn test_forecast_accepts_issuer_payload() {
        let forecast: WeatherForecast = serde_json::from_str(
            r#"{"date":"2024-06-02","temperatureC":20,"temperatureF":67,"summary":"Mild"}"#,
        )
        .unwrap();
        assert_eq!(forecast.temperature_c, 20);
        assert_eq!(forecast.summary.as_deref(), Some("Mild"));
    }
}

//! Structured advice payload carried by a successful `agricultural_response`.
//!
//! The backend assembles this object from LLM output, so every field is
//! optional and decoded leniently: wrong-typed scalars become absent, a bare
//! string where a list was expected becomes a one-item list, and a section
//! delivered as a JSON-encoded string is parsed in place.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{RelayError, Result};

/// The `data` object of an `agricultural_response`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdvicePayload {
    /// Echo of the user's question.
    #[serde(deserialize_with = "lenient::text")]
    pub query: Option<String>,
    /// Detected location; `Unknown` when the backend could not tell.
    #[serde(deserialize_with = "lenient::text")]
    pub location: Option<String>,
    /// Language the backend answered in.
    #[serde(deserialize_with = "lenient::text")]
    pub language: Option<String>,
    /// Topics the backend classified the question under.
    #[serde(deserialize_with = "lenient::list")]
    pub detected_intents: Vec<String>,
    /// Structured multi-section advice; selects the comprehensive layout.
    #[serde(deserialize_with = "lenient::section")]
    pub comprehensive_advice: Option<ComprehensiveAdvice>,
    /// Plain advice text.
    #[serde(deserialize_with = "lenient::text")]
    pub final_advice: Option<String>,
    /// Reasoning behind the advice.
    #[serde(deserialize_with = "lenient::text")]
    pub explanation: Option<String>,
    /// Advice translated into the requested language.
    #[serde(deserialize_with = "lenient::text")]
    pub translated_response: Option<String>,
    /// Explanation translated into the requested language.
    #[serde(deserialize_with = "lenient::text")]
    pub translated_explanation: Option<String>,
}

impl AdvicePayload {
    /// Decode from the raw `data` value.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(RelayError::response("advice payload is not an object"));
        }
        serde_json::from_value(value).map_err(|e| RelayError::response(e.to_string()))
    }

    /// Whether the comprehensive layout applies.
    pub fn is_comprehensive(&self) -> bool {
        self.comprehensive_advice.is_some()
    }
}

/// Multi-section advice.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComprehensiveAdvice {
    /// Headline advice.
    #[serde(deserialize_with = "lenient::text")]
    pub final_advice: Option<String>,
    /// Weather conditions and guidance.
    #[serde(deserialize_with = "lenient::section")]
    pub weather_analysis: Option<WeatherAnalysis>,
    /// Soil nutrients and recommendations.
    #[serde(deserialize_with = "lenient::section")]
    pub soil_analysis: Option<SoilAnalysis>,
    /// Mandi prices and timing.
    #[serde(deserialize_with = "lenient::section")]
    pub market_insights: Option<MarketInsights>,
    /// Ordered, most urgent first.
    #[serde(deserialize_with = "lenient::list")]
    pub priority_actions: Vec<String>,
    /// Economics of the recommendation.
    #[serde(deserialize_with = "lenient::section")]
    pub cost_benefit: Option<CostBenefit>,
    /// Ordered warnings.
    #[serde(deserialize_with = "lenient::list")]
    pub risk_warnings: Vec<String>,
    /// Either a 0..=1 fraction or a 0..=100 percentage.
    #[serde(deserialize_with = "lenient::number")]
    pub confidence_score: Option<f64>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeatherAnalysis {
    #[serde(deserialize_with = "lenient::text")]
    pub current_conditions: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub farming_suitability: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub next_24h_guidance: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SoilAnalysis {
    #[serde(deserialize_with = "lenient::text")]
    pub nutrient_status: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub soil_health_score: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub immediate_actions: Vec<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub crop_recommendations: Vec<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MarketInsights {
    #[serde(deserialize_with = "lenient::text")]
    pub current_prices: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub price_trend: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub selling_timing: Option<String>,
}

#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CostBenefit {
    #[serde(deserialize_with = "lenient::text")]
    pub estimated_cost: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub expected_return: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub roi_timeframe: Option<String>,
}

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn text_of(value: Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(text_of(Value::deserialize(d)?))
    }

    pub(super) fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(text_of).collect(),
            other => text_of(other).into_iter().collect(),
        })
    }

    pub(super) fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
            _ => None,
        })
    }

    pub(super) fn section<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = match Value::deserialize(d)? {
            Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
            other => other,
        };
        if !value.is_object() {
            return Ok(None);
        }
        Ok(serde_json::from_value(value).ok())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

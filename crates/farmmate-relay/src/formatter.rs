//! Final reply rendering.
//!
//! Two layouts, chosen by the presence of `comprehensive_advice`:
//!
//! - **comprehensive**: headline, then weather, soil, market, priority
//!   actions, cost-benefit, risk warnings and confidence, always in that order
//! - **simple**: translated or plain advice with its explanation
//!
//! Both end with the location and topic lines when the payload has them.
//! Blocks are separated by a blank line.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::advice::{AdvicePayload, ComprehensiveAdvice};
use crate::i18n::{Language, Localizer};
use crate::protocol::AiResponse;

/// Reply type attached to formatted replies.
pub const AGRICULTURAL_ADVICE: &str = "agricultural_advice";

/// Location value the backend uses when it could not detect one.
const UNKNOWN_LOCATION: &str = "Unknown";

/// A rendered reply ready for the client.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedReply {
    /// Display text.
    pub text: String,
    /// Always `true` for formatted payloads.
    pub success: bool,
    /// Language the labels were rendered in.
    pub language: Language,
    /// Whether the comprehensive layout was used.
    pub comprehensive: bool,
    /// Render time.
    pub timestamp: DateTime<Utc>,
}

impl FormattedReply {
    /// Convert into the `ai_response` payload.
    pub fn into_response(self) -> AiResponse {
        AiResponse {
            message: self.text,
            success: self.success,
            kind: Some(AGRICULTURAL_ADVICE.to_owned()),
            language: Some(self.language),
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            comprehensive: Some(self.comprehensive),
        }
    }
}

/// Renders advice payloads through a [`Localizer`].
#[derive(Clone)]
pub struct ResponseFormatter {
    localizer: Arc<dyn Localizer>,
}

impl ResponseFormatter {
    /// Create a formatter.
    pub fn new(localizer: Arc<dyn Localizer>) -> Self {
        Self { localizer }
    }

    /// Render `payload` with labels in `language`.
    pub fn format(&self, payload: &AdvicePayload, language: Language) -> FormattedReply {
        let mut blocks = match &payload.comprehensive_advice {
            Some(advice) => self.comprehensive(payload, advice, language),
            None => self.simple(payload, language),
        };

        if let Some(location) = payload
            .location
            .as_deref()
            .filter(|loc| *loc != UNKNOWN_LOCATION)
        {
            blocks.push(format!("📍 {}: {location}", self.label("location", language)));
        }
        if !payload.detected_intents.is_empty() {
            blocks.push(format!(
                "🎯 {}: {}",
                self.label("topic", language),
                payload.detected_intents.join(", ")
            ));
        }

        FormattedReply {
            text: blocks.join("\n\n"),
            success: true,
            language,
            comprehensive: payload.is_comprehensive(),
            timestamp: Utc::now(),
        }
    }

    fn simple(&self, payload: &AdvicePayload, language: Language) -> Vec<String> {
        let translated = payload
            .translated_response
            .as_ref()
            .filter(|_| language != Language::DEFAULT);

        let (body, explanation) = match translated {
            Some(text) => (text.clone(), payload.translated_explanation.as_ref()),
            None => (
                payload
                    .final_advice
                    .clone()
                    .unwrap_or_else(|| self.label("noAdvice", language)),
                payload.explanation.as_ref(),
            ),
        };

        let mut blocks = vec![body];
        if let Some(explanation) = explanation {
            blocks.push(format!("{}: {explanation}", self.label("explanation", language)));
        }
        blocks
    }

    fn comprehensive(
        &self,
        payload: &AdvicePayload,
        advice: &ComprehensiveAdvice,
        lang: Language,
    ) -> Vec<String> {
        let headline = advice
            .final_advice
            .clone()
            .or_else(|| payload.final_advice.clone())
            .unwrap_or_else(|| self.label("noAdvice", lang));
        let mut blocks = vec![headline];

        if let Some(weather) = &advice.weather_analysis {
            blocks.push(self.section(
                "🌤️",
                "weatherAnalysis",
                lang,
                vec![
                    self.field("currentConditions", weather.current_conditions.as_deref(), lang),
                    self.field("farmingSuitability", weather.farming_suitability.as_deref(), lang),
                    self.field("next24h", weather.next_24h_guidance.as_deref(), lang),
                ],
            ));
        }

        if let Some(soil) = &advice.soil_analysis {
            let mut lines = vec![
                self.field("nutrientStatus", soil.nutrient_status.as_deref(), lang),
                self.field("healthScore", soil.soil_health_score.as_deref(), lang),
            ];
            lines.extend(self.nested_list("immediateActions", &soil.immediate_actions, lang));
            lines.extend(self.nested_list(
                "cropRecommendations",
                &soil.crop_recommendations,
                lang,
            ));
            blocks.push(self.section("🌱", "soilAnalysis", lang, lines));
        }

        if let Some(market) = &advice.market_insights {
            blocks.push(self.section(
                "📈",
                "marketInsights",
                lang,
                vec![
                    self.field("currentPrices", market.current_prices.as_deref(), lang),
                    self.field("priceTrend", market.price_trend.as_deref(), lang),
                    self.field("sellingTiming", market.selling_timing.as_deref(), lang),
                ],
            ));
        }

        if !advice.priority_actions.is_empty() {
            blocks.push(self.section(
                "⚡",
                "priorityActions",
                lang,
                numbered(&advice.priority_actions),
            ));
        }

        if let Some(cost) = &advice.cost_benefit {
            blocks.push(self.section(
                "💰",
                "costBenefit",
                lang,
                vec![
                    self.field("estimatedCost", cost.estimated_cost.as_deref(), lang),
                    self.field("expectedReturn", cost.expected_return.as_deref(), lang),
                    self.field("roiTimeframe", cost.roi_timeframe.as_deref(), lang),
                ],
            ));
        }

        if !advice.risk_warnings.is_empty() {
            let lines = advice.risk_warnings.iter().map(|w| format!("• {w}")).collect();
            blocks.push(self.section("⚠️", "riskWarnings", lang, lines));
        }

        let confidence = advice
            .confidence_score
            .and_then(percent)
            .unwrap_or_else(|| self.label("notAvailable", lang));
        blocks.push(format!("📊 {}: {confidence}", self.label("confidence", lang)));

        blocks
    }

    fn section(&self, icon: &str, title: &str, lang: Language, lines: Vec<String>) -> String {
        let mut out = format!("{icon} {}", self.label(title, lang));
        for line in lines {
            out.push('\n');
            out.push_str(&line);
        }
        out
    }

    fn field(&self, key: &str, value: Option<&str>, lang: Language) -> String {
        let value = value.map_or_else(|| self.label("notAvailable", lang), str::to_owned);
        format!("• {}: {value}", self.label(key, lang))
    }

    fn nested_list(&self, key: &str, items: &[String], lang: Language) -> Option<String> {
        if items.is_empty() {
            return None;
        }
        let mut out = format!("• {}:", self.label(key, lang));
        for item in items {
            out.push_str("\n  • ");
            out.push_str(item);
        }
        Some(out)
    }

    fn label(&self, key: &str, lang: Language) -> String {
        self.localizer.label(key, lang)
    }
}

fn numbered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect()
}

/// Scores in `0..=1` are fractions; anything larger is already a percentage.
fn percent(score: f64) -> Option<String> {
    if !score.is_finite() {
        return None;
    }
    let pct = if score <= 1.0 { score * 100.0 } else { score };
    Some(format!("{pct:.1}%"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

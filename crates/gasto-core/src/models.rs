//! Domain models for Gasto

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One subscription as an AI provider reports it, in the compact wire shape
/// `{"n": name, "v": monthly value, "c": category hint}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSubscription {
    /// Service name
    pub n: String,
    /// Monthly value in BRL. Providers occasionally return it as a string
    /// ("55,90"); anything non-numeric deserializes to `None`.
    #[serde(default, deserialize_with = "lenient_value")]
    pub v: Option<f64>,
    /// Free-form category hint (e.g. "streaming video")
    #[serde(default)]
    pub c: String,
}

impl RawSubscription {
    pub fn new(name: impl Into<String>, value: f64, category: impl Into<String>) -> Self {
        Self {
            n: name.into(),
            v: Some(value),
            c: category.into(),
        }
    }
}

/// Accepts a JSON number, a numeric string (comma or dot decimal separator),
/// or null/absent. Non-numeric strings become `None` rather than failing the
/// whole reply.
fn lenient_value<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<NumberOrText>::deserialize(deserializer)? {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().replace(',', ".").parse().ok(),
        None => None,
    })
}

/// Envelope every provider must reply with: `{"subs": [...]}`.
///
/// A reply that parses as JSON but lacks the `subs` key is treated as an
/// empty extraction, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReply {
    #[serde(default)]
    pub subs: Vec<RawSubscription>,
}

/// Closed category taxonomy for normalized subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Streaming,
    #[serde(rename = "Software/App")]
    Software,
    #[serde(rename = "Saúde")]
    Saude,
    Games,
    Outros,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streaming => "Streaming",
            Self::Software => "Software/App",
            Self::Saude => "Saúde",
            Self::Games => "Games",
            Self::Outros => "Outros",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "streaming" => Ok(Self::Streaming),
            "software/app" | "software" => Ok(Self::Software),
            "saúde" | "saude" => Ok(Self::Saude),
            "games" => Ok(Self::Games),
            "outros" => Ok(Self::Outros),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected subscription, normalized for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionItem {
    pub name: String,
    pub category: Category,
    /// Monthly cost in BRL
    pub monthly_cost: f64,
    /// Annual cost in BRL, always `monthly_cost * 12`
    pub annual_cost: f64,
    /// Extraction confidence in `[0, 1]`
    pub confidence: f64,
    /// The original statement text that matched, when known
    pub description: String,
}

/// A complete statement analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Opaque report key. Collision-resistant, but not a security boundary.
    pub id: String,
    /// When the analysis ran
    pub date: DateTime<Utc>,
    pub items: Vec<SubscriptionItem>,
    pub total_monthly: f64,
    pub total_annual: f64,
    pub subscription_count: usize,
    /// Annual spend recoverable by cancelling everything found
    pub potential_savings: f64,
}

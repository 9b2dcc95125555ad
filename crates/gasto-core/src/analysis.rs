//! Result shaping
//!
//! Turns the compact provider items into display records and aggregates
//! them into a priced report.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{AnalysisResult, Category, RawSubscription, SubscriptionItem};

/// Fixed confidence assigned to provider-extracted items
const EXTRACTION_CONFIDENCE: f64 = 0.9;

/// Map a free-form category hint onto the closed taxonomy
///
/// Case-insensitive substring matching, first rule wins; anything
/// unrecognized lands in `Outros`.
pub fn map_category(hint: &str) -> Category {
    let c = hint.to_lowercase();
    if c.contains("video") || c.contains("music") || c.contains("tv") || c.contains("stream") {
        Category::Streaming
    } else if c.contains("software")
        || c.contains("app")
        || c.contains("saas")
        || c.contains("cloud")
    {
        Category::Software
    } else if c.contains("gym") || c.contains("fit") || c.contains("health") || c.contains("med") {
        Category::Saude
    } else if c.contains("game") || c.contains("jogos") || c.contains("xbox") || c.contains("psn") {
        Category::Games
    } else {
        Category::Outros
    }
}

/// Normalize raw provider items into display records
///
/// Items with a missing, non-numeric, or non-positive value are dropped
/// here rather than propagated into report totals.
pub fn normalize_items(subs: &[RawSubscription]) -> Vec<SubscriptionItem> {
    subs.iter()
        .filter_map(|sub| {
            let value = sub.v.filter(|v| *v > 0.0)?;
            Some(SubscriptionItem {
                name: sub.n.clone(),
                category: map_category(&sub.c),
                monthly_cost: value,
                annual_cost: value * 12.0,
                confidence: EXTRACTION_CONFIDENCE,
                description: sub.c.clone(),
            })
        })
        .collect()
}

/// Aggregate normalized items into a priced report
///
/// Empty input is valid and produces a zeroed report. Only runs on a
/// successful extraction; failures stay typed errors upstream.
pub fn aggregate(items: Vec<SubscriptionItem>) -> AnalysisResult {
    let total_monthly: f64 = items.iter().map(|i| i.monthly_cost).sum();
    let total_annual = total_monthly * 12.0;

    AnalysisResult {
        id: Uuid::new_v4().simple().to_string(),
        date: Utc::now(),
        subscription_count: items.len(),
        items,
        total_monthly,
        total_annual,
        potential_savings: total_annual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_category_streaming() {
        assert_eq!(map_category("streaming video"), Category::Streaming);
        assert_eq!(map_category("music"), Category::Streaming);
        assert_eq!(map_category("TV por assinatura"), Category::Streaming);
    }

    #[test]
    fn test_map_category_software() {
        assert_eq!(map_category("software"), Category::Software);
        assert_eq!(map_category("App de produtividade"), Category::Software);
        assert_eq!(map_category("SaaS"), Category::Software);
        assert_eq!(map_category("cloud storage"), Category::Software);
    }

    #[test]
    fn test_map_category_saude() {
        assert_eq!(map_category("gym"), Category::Saude);
        assert_eq!(map_category("fitness"), Category::Saude);
        assert_eq!(map_category("health plan"), Category::Saude);
        assert_eq!(map_category("telemedicina"), Category::Saude);
    }

    #[test]
    fn test_map_category_games() {
        assert_eq!(map_category("games"), Category::Games);
        assert_eq!(map_category("Jogos online"), Category::Games);
        assert_eq!(map_category("xbox live"), Category::Games);
        assert_eq!(map_category("PSN Plus"), Category::Games);
    }

    #[test]
    fn test_map_category_unknown_is_outros() {
        assert_eq!(map_category("assinatura"), Category::Outros);
        assert_eq!(map_category(""), Category::Outros);
        // Accented hints miss the ASCII keyword table
        assert_eq!(map_category("Música"), Category::Outros);
    }

    #[test]
    fn test_map_category_first_rule_wins() {
        // Matches both "tv" (streaming) and "app" (software)
        assert_eq!(map_category("app de tv"), Category::Streaming);
    }

    #[test]
    fn test_normalize_items_basic() {
        let subs = vec![RawSubscription::new("Netflix", 55.90, "streaming video")];
        let items = normalize_items(&subs);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Netflix");
        assert_eq!(items[0].category, Category::Streaming);
        assert!((items[0].monthly_cost - 55.90).abs() < 1e-9);
        assert!((items[0].annual_cost - 670.80).abs() < 1e-9);
        assert!((items[0].confidence - 0.9).abs() < 1e-9);
        assert_eq!(items[0].description, "streaming video");
    }

    #[test]
    fn test_normalize_items_annual_is_monthly_times_twelve() {
        let subs = vec![
            RawSubscription::new("A", 10.0, "x"),
            RawSubscription::new("B", 21.9, "y"),
            RawSubscription::new("C", 104.9, "z"),
        ];
        for item in normalize_items(&subs) {
            assert!((item.annual_cost - item.monthly_cost * 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_normalize_items_drops_bad_values() {
        let subs = vec![
            RawSubscription::new("Free", 0.0, "app"),
            RawSubscription::new("Refund", -55.9, "tv"),
            RawSubscription {
                n: "NoValue".to_string(),
                v: None,
                c: "app".to_string(),
            },
            RawSubscription::new("Kept", 9.9, "app"),
        ];

        let items = normalize_items(&subs);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Kept");
    }

    #[test]
    fn test_aggregate_totals() {
        let items = normalize_items(&[
            RawSubscription::new("Netflix", 55.9, "tv"),
            RawSubscription::new("Spotify", 21.9, "music"),
        ]);
        let report = aggregate(items);

        assert!((report.total_monthly - 77.8).abs() < 1e-9);
        assert!((report.total_annual - report.total_monthly * 12.0).abs() < 1e-9);
        assert!((report.potential_savings - report.total_annual).abs() < 1e-9);
        assert_eq!(report.subscription_count, 2);
        assert_eq!(report.subscription_count, report.items.len());
    }

    #[test]
    fn test_aggregate_empty_is_zeroed() {
        let report = aggregate(vec![]);
        assert_eq!(report.subscription_count, 0);
        assert!(report.items.is_empty());
        assert_eq!(report.total_monthly, 0.0);
        assert_eq!(report.total_annual, 0.0);
        assert_eq!(report.potential_savings, 0.0);
    }

    #[test]
    fn test_aggregate_ids_are_opaque_and_distinct() {
        let a = aggregate(vec![]);
        let b = aggregate(vec![]);

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

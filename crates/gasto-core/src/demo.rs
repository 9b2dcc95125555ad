//! Demo report
//!
//! A realistic canned analysis for the "see an example" flow: eight
//! subscriptions a typical statement would surface, including the disguised
//! merchant spellings the extractor is built to catch.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{AnalysisResult, Category, SubscriptionItem};

const DEMO_ITEMS: &[(&str, f64, Category, f64, &str)] = &[
    ("Netflix", 55.90, Category::Streaming, 0.98, "Netflix.com/bill"),
    ("Spotify Premium", 21.90, Category::Streaming, 0.95, "Spotify AB"),
    ("ChatGPT Plus", 104.90, Category::Software, 0.92, "OpenAI *ChatGPT"),
    ("Adobe Creative Cloud", 224.00, Category::Software, 0.97, "Adobe Systems"),
    ("iCloud+ 200GB", 10.90, Category::Software, 0.88, "Apple.com/bill"),
    ("Smart Fit", 119.90, Category::Saude, 0.99, "Smart Fit Academia"),
    ("YouTube Premium", 24.90, Category::Streaming, 0.94, "Google *YouTube"),
    ("Xbox Game Pass", 44.99, Category::Games, 0.91, "Microsoft *Xbox"),
];

/// Build a fresh demo report
///
/// Same items every time; the id (prefixed `demo-`) and date are fresh per
/// call so demo reports never collide with each other in the report vault.
pub fn demo_report() -> AnalysisResult {
    let items: Vec<SubscriptionItem> = DEMO_ITEMS
        .iter()
        .map(|&(name, monthly_cost, category, confidence, description)| SubscriptionItem {
            name: name.to_string(),
            category,
            monthly_cost,
            annual_cost: monthly_cost * 12.0,
            confidence,
            description: description.to_string(),
        })
        .collect();

    let total_monthly: f64 = items.iter().map(|i| i.monthly_cost).sum();
    let total_annual = total_monthly * 12.0;

    AnalysisResult {
        id: format!("demo-{}", Uuid::new_v4().simple()),
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
    fn test_demo_report_items() {
        let report = demo_report();
        assert_eq!(report.subscription_count, 8);
        assert_eq!(report.items.len(), 8);
        assert_eq!(report.items[0].name, "Netflix");
        assert_eq!(report.items[5].category, Category::Saude);
        assert_eq!(report.items[7].description, "Microsoft *Xbox");
    }

    #[test]
    fn test_demo_report_totals() {
        let report = demo_report();
        assert!((report.total_monthly - 607.39).abs() < 1e-9);
        assert!((report.total_annual - 7288.68).abs() < 1e-9);
        assert!((report.potential_savings - report.total_annual).abs() < 1e-9);

        for item in &report.items {
            assert!((item.annual_cost - item.monthly_cost * 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_demo_report_ids_are_fresh() {
        let a = demo_report();
        let b = demo_report();

        assert!(a.id.starts_with("demo-"));
        assert!(b.id.starts_with("demo-"));
        assert_ne!(a.id, b.id);
    }
}

//! Plain-text client card and score summary.

use credence_data::ClientRecord;
use credence_model::{FeatureContribution, Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity card of the selected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCard {
    /// The client
    pub record: ClientRecord,
}

impl ClientCard {
    /// Card for a client.
    pub const fn new(record: ClientRecord) -> Self {
        Self { record }
    }

    /// Render as a small text block.
    pub fn to_ascii_table(&self) -> String {
        let r = &self.record;
        let mut output = String::new();
        output.push_str(&format!("\nClient {}\n", r.id));
        output.push_str(&"-".repeat(48));
        output.push('\n');
        output.push_str(&format!("  Gender:          {}\n", r.gender));
        output.push_str(&format!("  Family status:   {}\n", r.family_status));
        output.push_str(&format!("  Children:        {}\n", r.children));
        output.push_str(&format!("  Age:             {}\n", r.age_years));
        output.push_str(&format!("  Income type:     {}\n", r.income_type));
        output.push_str(&format!("  Education:       {}\n", r.education));
        output.push_str(&format!("  Housing:         {}\n", r.housing));
        output.push_str(&format!("  Income:          {}\n", amount(r.income_total)));
        output.push_str(&format!("  Credit:          {}\n", amount(r.credit)));
        output.push_str(&format!("  Annuity:         {}\n", amount(r.annuity)));
        output
    }
}

impl fmt::Display for ClientCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii_table())
    }
}

fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.0}"))
}

/// Score of a client with its largest contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Client identifier
    pub client_id: i64,
    /// Probability and decision
    pub score: Score,
    /// Expected margin
    pub baseline: f64,
    /// Client's raw margin
    pub margin: f64,
    /// Contributions, largest magnitude first
    pub contributions: Vec<FeatureContribution>,
}

impl ScoreSummary {
    /// Render as a text block listing the `top` contributions.
    pub fn to_ascii_table(&self, top: usize) -> String {
        let mut output = String::new();
        output.push_str(&format!("\nScore: client {}\n", self.client_id));
        output.push_str(&"=".repeat(72));
        output.push('\n');
        output.push_str(&format!(
            "  Default probability:  {:.1}%\n",
            self.score.percent()
        ));
        output.push_str(&format!(
            "  Decision:             {} ({})\n",
            self.score.decision,
            self.score.decision.color_name()
        ));
        output.push_str(&format!("  Baseline margin:      {:.4}\n", self.baseline));
        output.push_str(&format!("  Client margin:        {:.4}\n", self.margin));

        if !self.contributions.is_empty() {
            output.push_str("\nLargest contributions:\n");
            output.push_str(&"-".repeat(72));
            output.push('\n');
            output.push_str(&format!(
                "  {:<36} {:>14} {:>14}\n",
                "Feature", "Value", "Contribution"
            ));
            for c in self.contributions.iter().take(top) {
                output.push_str(&format!(
                    "  {:<36} {:>14.4} {:>+14.4}\n",
                    c.feature, c.value, c.contribution
                ));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ClientRecord {
        ClientRecord {
            id: 101,
            gender: "F".into(),
            age_years: 20,
            family_status: "Married".into(),
            children: 0,
            income_type: "Working".into(),
            education: "Higher education".into(),
            housing: "House / apartment".into(),
            income_total: Some(135000.5),
            credit: Some(568800.0),
            annuity: None,
        }
    }

    #[test]
    fn test_client_card() {
        let card = ClientCard::new(record()).to_string();
        assert!(card.contains("Client 101"));
        assert!(card.contains("Married"));
        assert!(card.contains("Annuity:         n/a"));
    }

    #[test]
    fn test_score_summary_truncates_contributions() {
        let summary = ScoreSummary {
            client_id: 101,
            score: Score::from_probability(0.2),
            baseline: -2.4,
            margin: -1.38,
            contributions: vec![
                FeatureContribution {
                    feature: "EXT_SOURCE_3".into(),
                    value: 0.7,
                    contribution: -0.5,
                },
                FeatureContribution {
                    feature: "DAYS_BIRTH".into(),
                    value: -7300.0,
                    contribution: 0.1,
                },
            ],
        };
        let text = summary.to_ascii_table(1);
        assert!(text.contains("20.0%"));
        assert!(text.contains("Approved (Green)"));
        assert!(text.contains("EXT_SOURCE_3"));
        assert!(!text.contains("DAYS_BIRTH"));
    }
}

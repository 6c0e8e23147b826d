//! Shared recommendation types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AdvisorError;

/// Upper bound on the number of actions a well-formed recommendation carries
pub const MAX_ACTIONS: usize = 5;

/// Subject area a recommendation request pertains to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Energy,
    Transport,
    Grid,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Energy, Domain::Transport, Domain::Grid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Energy => "energy",
            Domain::Transport => "transport",
            Domain::Grid => "grid",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "energy" => Ok(Domain::Energy),
            "transport" => Ok(Domain::Transport),
            "grid" => Ok(Domain::Grid),
            other => Err(AdvisorError::Validation {
                message: format!(
                    "unknown domain '{}', expected one of energy, transport, grid",
                    other
                ),
            }),
        }
    }
}

/// Coarse severity/benefit rating of a recommendation set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImpactTier {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
}

impl fmt::Display for ImpactTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImpactTier::High => "High",
            ImpactTier::Medium => "Medium",
            ImpactTier::Low => "Low",
        };
        f.write_str(label)
    }
}

/// Structured recommendation returned to the presentation layer.
///
/// Field names on the wire follow the generative endpoint's reply format
/// (`recommendations`, `impact`, `savings`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Presentation-ordered actions, not sorted
    #[serde(rename = "recommendations")]
    pub actions: Vec<String>,
    #[serde(rename = "impact")]
    pub impact_tier: ImpactTier,
    /// Free-form label; source data mixes percentages, durations and qualitative text
    #[serde(rename = "savings")]
    pub savings_label: String,
}

impl Recommendation {
    pub fn new<I, S>(actions: I, impact_tier: ImpactTier, savings_label: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actions: actions.into_iter().map(Into::into).collect(),
            impact_tier,
            savings_label: savings_label.into(),
        }
    }

    /// 1-5 actions and a non-empty savings label.
    pub fn is_well_formed(&self) -> bool {
        (1..=MAX_ACTIONS).contains(&self.actions.len())
            && !self.savings_label.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parses_case_insensitively() {
        assert_eq!("Energy".parse::<Domain>().unwrap(), Domain::Energy);
        assert_eq!(" GRID ".parse::<Domain>().unwrap(), Domain::Grid);
        assert!("water".parse::<Domain>().is_err());
    }

    #[test]
    fn recommendation_uses_endpoint_field_names() {
        let rec = Recommendation::new(["a", "b"], ImpactTier::Low, "5%");
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["recommendations"][1], "b");
        assert_eq!(value["impact"], "Low");
        assert_eq!(value["savings"], "5%");
    }

    #[test]
    fn impact_accepts_lowercase_input() {
        let rec: Recommendation = serde_json::from_str(
            r#"{"recommendations":["x"],"impact":"medium","savings":"3%"}"#,
        )
        .unwrap();
        assert_eq!(rec.impact_tier, ImpactTier::Medium);
    }

    #[test]
    fn well_formed_bounds() {
        assert!(!Recommendation::new(Vec::<String>::new(), ImpactTier::High, "1%").is_well_formed());
        assert!(!Recommendation::new(["a"], ImpactTier::High, " ").is_well_formed());
        assert!(!Recommendation::new(["a"; 6], ImpactTier::High, "1%").is_well_formed());
        assert!(Recommendation::new(["a"; 5], ImpactTier::High, "1%").is_well_formed());
    }
}

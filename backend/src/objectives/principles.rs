//! Welfare principles
//!
//! A principle collapses the six objective values into one scalar with a
//! maximisation direction. Selected by name in the configuration:
//!
//! | name                     | principle                          |
//! |--------------------------|------------------------------------|
//! | `None` / `none`          | no scalar                          |
//! | `uwf` / `utilitarian`    | `Σ (1 - o)`                        |
//! | `pwf` / `prioritarian`   | concave transform with γ = 3       |
//! | `gini` / `egalitarian`   | `1 - Gini(o)`                      |

use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inequality aversion of the prioritarian principle
pub const PRIORITARIAN_GAMMA: f64 = 3.0;

/// Scalarisation applied after the objectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Principle {
    #[default]
    None,
    Utilitarian,
    Prioritarian,
    Egalitarian,
}

impl Principle {
    /// Canonical configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            Principle::None => "None",
            Principle::Utilitarian => "uwf",
            Principle::Prioritarian => "pwf",
            Principle::Egalitarian => "gini",
        }
    }
}

impl FromStr for Principle {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" | "none" => Ok(Principle::None),
            "uwf" | "utilitarian" => Ok(Principle::Utilitarian),
            "pwf" | "prioritarian" => Ok(Principle::Prioritarian),
            "gini" | "egalitarian" => Ok(Principle::Egalitarian),
            other => Err(ModelError::UnknownPrinciple(other.to_string())),
        }
    }
}

impl TryFrom<String> for Principle {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Principle> for String {
    fn from(principle: Principle) -> Self {
        principle.as_str().to_string()
    }
}

impl fmt::Display for Principle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar welfare score of an objective vector
pub trait WelfarePrinciple: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, objectives: &[f64]) -> f64;
}

/// `Σ (1 - oᵢ)`
#[derive(Debug, Clone, Copy, Default)]
pub struct UtilitarianWelfare;

impl WelfarePrinciple for UtilitarianWelfare {
    fn name(&self) -> &'static str {
        "uwf"
    }

    fn score(&self, objectives: &[f64]) -> f64 {
        objectives.iter().map(|o| 1.0 - o).sum()
    }
}

/// Sum of `(1 - o)^(1-γ) / (1-γ)` with a guard at `o = 1`
#[derive(Debug, Clone, Copy)]
pub struct PrioritarianWelfare {
    pub gamma: f64,
}

impl Default for PrioritarianWelfare {
    fn default() -> Self {
        Self {
            gamma: PRIORITARIAN_GAMMA,
        }
    }
}

impl PrioritarianWelfare {
    fn term(&self, objective: f64) -> f64 {
        let exponent = 1.0 - self.gamma;
        if 1.0 - objective == 0.0 {
            0.0
        } else if objective >= 0.0 {
            (1.0 - objective).powf(exponent) / exponent
        } else {
            (1.0 + objective.abs()).powf(exponent) / exponent
        }
    }
}

impl WelfarePrinciple for PrioritarianWelfare {
    fn name(&self) -> &'static str {
        "pwf"
    }

    fn score(&self, objectives: &[f64]) -> f64 {
        objectives.iter().map(|&o| self.term(o)).sum()
    }
}

/// `1 - Σᵢⱼ |oᵢ - oⱼ| / (2 n Σ o)`
///
/// A zero denominator (all objectives zero, or an empty vector) scores 1.0,
/// perfect equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct EgalitarianWelfare;

impl WelfarePrinciple for EgalitarianWelfare {
    fn name(&self) -> &'static str {
        "gini"
    }

    fn score(&self, objectives: &[f64]) -> f64 {
        let mut sorted = objectives.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let total: f64 = sorted.iter().sum();
        let denominator = 2.0 * n * total;
        if denominator == 0.0 {
            return 1.0;
        }

        let differences: f64 = sorted
            .iter()
            .map(|a| sorted.iter().map(|b| (a - b).abs()).sum::<f64>())
            .sum();

        1.0 - differences / denominator
    }
}

/// Build the scorer for a principle (`None` for no principle)
pub fn build_principle(principle: Principle) -> Option<Box<dyn WelfarePrinciple>> {
    match principle {
        Principle::None => None,
        Principle::Utilitarian => Some(Box::new(UtilitarianWelfare)),
        Principle::Prioritarian => Some(Box::new(PrioritarianWelfare::default())),
        Principle::Egalitarian => Some(Box::new(EgalitarianWelfare)),
    }
}

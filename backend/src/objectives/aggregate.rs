//! The six basin objectives
//!
//! Computed once per evaluation from the fully populated series, in this
//! fixed order:
//!
//! 1. Primary district aggregate deficit ratio
//! 2. Primary district 90th-percentile monthly deficit ratio
//! 3. Low-level frequency of the watched reservoir
//! 4. District group aggregate deficit ratio
//! 5. District group 90th-percentile monthly deficit ratio
//! 6. Hydropower aggregate deficit ratio of the watched reservoir
//!
//! Group statistics stack the member districts timestep-wise first, then
//! compute the ratio of the summed series. This differs from averaging the
//! members' own ratios whenever their targets differ.

use super::metrics::{
    aggregate_deficit_ratio, frequency_below, monthly_deficit_ratios,
    percentile_closest_observation, stack_sum,
};
use crate::models::{IrrigationDistrict, Reservoir};
use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};

/// Number of basin objectives
pub const OBJECTIVE_COUNT: usize = 6;

fn default_percentile() -> f64 {
    90.0
}

/// Which entities the objectives are computed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectiveConfig {
    /// District scored on its own (objectives 1 and 2)
    pub primary_district: String,

    /// Districts scored as one group (objectives 4 and 5).
    /// `None` means every district except the primary one.
    #[serde(default)]
    pub district_group: Option<Vec<String>>,

    /// Reservoir whose level is watched (objective 3)
    pub low_level_reservoir: String,

    /// Level below which a month counts as low (m a.s.l.)
    pub low_level_threshold: f64,

    /// Reservoir whose hydropower deficit is scored (objective 6)
    pub hydropower_reservoir: String,

    /// Percentile of the worst-month statistics
    #[serde(default = "default_percentile")]
    pub percentile: f64,
}

/// The six objective values of one evaluation (lower is better)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    pub primary_agg_deficit_ratio: f64,
    pub primary_percentile_deficit_ratio: f64,
    pub low_level_frequency: f64,
    pub group_agg_deficit_ratio: f64,
    pub group_percentile_deficit_ratio: f64,
    pub hydropower_agg_deficit_ratio: f64,
}

impl Objectives {
    /// Objective values in their fixed order
    pub fn to_array(&self) -> [f64; OBJECTIVE_COUNT] {
        [
            self.primary_agg_deficit_ratio,
            self.primary_percentile_deficit_ratio,
            self.low_level_frequency,
            self.group_agg_deficit_ratio,
            self.group_percentile_deficit_ratio,
            self.hydropower_agg_deficit_ratio,
        ]
    }
}

/// Objective configuration resolved to entity indices
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ObjectivePlan {
    primary: usize,
    group: Vec<usize>,
    low_level: usize,
    low_level_threshold: f64,
    hydropower: usize,
    percentile: f64,
}

impl ObjectivePlan {
    /// Resolve names against the declared districts and reservoirs
    pub(crate) fn resolve(
        config: &ObjectiveConfig,
        district_names: &[String],
        reservoir_names: &[String],
    ) -> Result<Self, ModelError> {
        let district = |name: &str| {
            district_names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ModelError::UnknownEntity(format!("irrigation district '{}'", name)))
        };
        let reservoir = |name: &str| {
            reservoir_names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ModelError::UnknownEntity(format!("reservoir '{}'", name)))
        };

        let primary = district(&config.primary_district)?;
        let group = match &config.district_group {
            Some(names) => names
                .iter()
                .map(|name| district(name))
                .collect::<Result<Vec<_>, _>>()?,
            None => (0..district_names.len()).filter(|&i| i != primary).collect(),
        };

        if let Some(i) = (1..group.len()).find(|&i| group[..i].contains(&group[i])) {
            return Err(ModelError::InvalidConfig(format!(
                "district_group lists '{}' more than once",
                district_names[group[i]]
            )));
        }

        if !config.low_level_threshold.is_finite() {
            return Err(ModelError::InvalidConfig(
                "low_level_threshold must be finite".to_string(),
            ));
        }

        if !(config.percentile > 0.0 && config.percentile <= 100.0) {
            return Err(ModelError::InvalidConfig(format!(
                "percentile must be in (0, 100], got {}",
                config.percentile
            )));
        }

        Ok(Self {
            primary,
            group,
            low_level: reservoir(&config.low_level_reservoir)?,
            low_level_threshold: config.low_level_threshold,
            hydropower: reservoir(&config.hydropower_reservoir)?,
            percentile: config.percentile,
        })
    }

    /// Reduce the accumulated series to the six objectives
    pub(crate) fn compute(
        &self,
        districts: &[IrrigationDistrict],
        reservoirs: &[Reservoir],
    ) -> Objectives {
        let primary = &districts[self.primary];
        let primary_monthly = monthly_deficit_ratios(primary.deficit(), primary.target());

        let group_deficits: Vec<&[f64]> =
            self.group.iter().map(|&i| districts[i].deficit()).collect();
        let group_targets: Vec<&[f64]> =
            self.group.iter().map(|&i| districts[i].target()).collect();
        let group_deficit = stack_sum(&group_deficits);
        let group_target = stack_sum(&group_targets);
        let group_monthly = monthly_deficit_ratios(&group_deficit, &group_target);

        let watched = &reservoirs[self.low_level];
        let hydropower = &reservoirs[self.hydropower];

        Objectives {
            primary_agg_deficit_ratio: aggregate_deficit_ratio(
                primary.deficit(),
                primary.target(),
            ),
            primary_percentile_deficit_ratio: percentile_closest_observation(
                &primary_monthly,
                self.percentile,
            ),
            low_level_frequency: frequency_below(watched.level(), self.low_level_threshold),
            group_agg_deficit_ratio: aggregate_deficit_ratio(&group_deficit, &group_target),
            group_percentile_deficit_ratio: percentile_closest_observation(
                &group_monthly,
                self.percentile,
            ),
            hydropower_agg_deficit_ratio: aggregate_deficit_ratio(
                hydropower.hydropower_deficit(),
                hydropower.hydropower_target(),
            ),
        }
    }
}

//! Routing topology
//!
//! The basin is walked once per month as an ordered list of routing nodes.
//! Each node is a reservoir or an irrigation district and sums its inflow
//! from sources routed earlier in the same walk:
//!
//! - a catchment's inflow at `t` (or `t - 1` when lagged),
//! - the release a reservoir just made,
//! - the leftover a district just passed on (or its leftover from the
//!   previous month when lagged, through a two-slot delay buffer).
//!
//! Validation happens once, at model construction. The resolved plan holds
//! indices only, so the monthly walk does no name lookups.

use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Hassanab inflow used at the first step of the Nile walk (m³/s)
pub const NILE_HASSANAB_WARMUP_INFLOW: f64 = 934.2;

// ============================================================================
// Declared Topology
// ============================================================================

/// What a routing node integrates its inflow into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Reservoir,
    Irrigation,
}

/// One contribution to a node's inflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FlowSource {
    /// Tributary inflow, `lag` months late (0 or 1)
    Catchment {
        name: String,
        #[serde(default)]
        lag: u8,
    },

    /// Release of a reservoir routed earlier this month
    Release { reservoir: String },

    /// Leftover of a district routed earlier, `lag` months late (0 or 1)
    Leftover {
        district: String,
        #[serde(default)]
        lag: u8,
    },
}

impl FlowSource {
    pub fn catchment(name: &str) -> Self {
        FlowSource::Catchment {
            name: name.to_string(),
            lag: 0,
        }
    }

    pub fn release(reservoir: &str) -> Self {
        FlowSource::Release {
            reservoir: reservoir.to_string(),
        }
    }

    pub fn leftover(district: &str) -> Self {
        FlowSource::Leftover {
            district: district.to_string(),
            lag: 0,
        }
    }

    /// The same source, delayed by `lag` months
    pub fn lagged(self, lag: u8) -> Self {
        match self {
            FlowSource::Catchment { name, .. } => FlowSource::Catchment { name, lag },
            FlowSource::Leftover { district, .. } => FlowSource::Leftover { district, lag },
            release @ FlowSource::Release { .. } => release,
        }
    }

    fn lag(&self) -> u8 {
        match self {
            FlowSource::Catchment { lag, .. } | FlowSource::Leftover { lag, .. } => *lag,
            FlowSource::Release { .. } => 0,
        }
    }
}

/// A reservoir or district and the sources feeding it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingNode {
    pub kind: NodeKind,
    pub name: String,
    pub inflows: Vec<FlowSource>,

    /// Whole input of the node at `t = 0` when any source is lagged.
    /// Without it lagged sources contribute zero at the first step.
    #[serde(default)]
    pub warmup_inflow: Option<f64>,
}

impl RoutingNode {
    pub fn reservoir(name: &str, inflows: Vec<FlowSource>) -> Self {
        Self {
            kind: NodeKind::Reservoir,
            name: name.to_string(),
            inflows,
            warmup_inflow: None,
        }
    }

    pub fn irrigation(name: &str, inflows: Vec<FlowSource>) -> Self {
        Self {
            kind: NodeKind::Irrigation,
            name: name.to_string(),
            inflows,
            warmup_inflow: None,
        }
    }

    pub fn with_warmup_inflow(mut self, inflow: f64) -> Self {
        self.warmup_inflow = Some(inflow);
        self
    }
}

/// The Nile walk, from the Ethiopian highlands down to Egypt
///
/// Reservoirs: GERD, Roseires, Sennar, HAD. Districts: USSennar, Gezira,
/// DSSennar, Taminiat, Hassanab, Egypt. The Taminiat leftover and the
/// Atbara inflow reach Hassanab one month late.
pub fn nile_routing() -> Vec<RoutingNode> {
    vec![
        RoutingNode::reservoir("GERD", vec![FlowSource::catchment("BlueNile")]),
        RoutingNode::reservoir(
            "Roseires",
            vec![
                FlowSource::catchment("GERDToRoseires"),
                FlowSource::release("GERD"),
            ],
        ),
        RoutingNode::irrigation(
            "USSennar",
            vec![
                FlowSource::release("Roseires"),
                FlowSource::catchment("RoseiresToAbuNaama"),
            ],
        ),
        RoutingNode::reservoir(
            "Sennar",
            vec![
                FlowSource::leftover("USSennar"),
                FlowSource::catchment("SukiToSennar"),
            ],
        ),
        RoutingNode::irrigation("Gezira", vec![FlowSource::release("Sennar")]),
        RoutingNode::irrigation(
            "DSSennar",
            vec![
                FlowSource::leftover("Gezira"),
                FlowSource::catchment("Dinder"),
                FlowSource::catchment("Rahad"),
            ],
        ),
        RoutingNode::irrigation(
            "Taminiat",
            vec![
                FlowSource::leftover("DSSennar"),
                FlowSource::catchment("WhiteNile"),
            ],
        ),
        RoutingNode::irrigation(
            "Hassanab",
            vec![
                FlowSource::leftover("Taminiat").lagged(1),
                FlowSource::catchment("Atbara").lagged(1),
            ],
        )
        .with_warmup_inflow(NILE_HASSANAB_WARMUP_INFLOW),
        RoutingNode::reservoir("HAD", vec![FlowSource::leftover("Hassanab")]),
        RoutingNode::irrigation("Egypt", vec![FlowSource::release("HAD")]),
    ]
}

// ============================================================================
// Delay Buffer
// ============================================================================

/// Two-slot FIFO carrying a leftover into the next month
///
/// `shift` is called exactly once per step with the current leftover; after
/// it, `front` returns the value shifted in at the previous step (zero at
/// the first step).
///
/// # Example
/// ```
/// use basin_sim_core_rs::orchestrator::DelayBuffer;
///
/// let mut buffer = DelayBuffer::new();
/// buffer.shift(5.0);
/// assert_eq!(buffer.front(), 0.0);
/// buffer.shift(7.0);
/// assert_eq!(buffer.front(), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DelayBuffer {
    slots: [f64; 2],
    /// Index of the oldest slot
    head: usize,
}

impl DelayBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the newest value, dropping the oldest
    pub fn shift(&mut self, value: f64) {
        self.slots[self.head] = value;
        self.head = (self.head + 1) % self.slots.len();
    }

    /// Oldest value held
    pub fn front(&self) -> f64 {
        self.slots[self.head]
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Resolved Plan
// ============================================================================

/// Entity a resolved node feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeTarget {
    Reservoir(usize),
    Irrigation(usize),
}

/// Index-based flow source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedSource {
    Catchment { index: usize, lagged: bool },
    Release { reservoir: usize },
    Leftover { district: usize },
    DelayedLeftover { buffer: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedNode {
    pub target: NodeTarget,
    pub sources: Vec<ResolvedSource>,
    /// Any source lagged by one month
    pub lagged: bool,
    pub warmup_inflow: Option<f64>,
}

/// Validated routing walk
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RoutingPlan {
    pub nodes: Vec<ResolvedNode>,
    /// Delay buffer fed by each district, if its leftover is lagged
    pub delay_for_district: Vec<Option<usize>>,
    pub buffer_count: usize,
}

fn position(names: &[String], name: &str) -> Option<usize> {
    names.iter().position(|n| n == name)
}

impl RoutingPlan {
    /// Validate the declared walk against the declared entities
    ///
    /// Every reservoir and district must be routed exactly once, sources
    /// must refer to entities routed earlier, and each release and leftover
    /// may feed one node only (water is never counted twice).
    pub(crate) fn resolve(
        routing: &[RoutingNode],
        reservoir_names: &[String],
        district_names: &[String],
        catchment_names: &[String],
    ) -> Result<Self, ModelError> {
        let invalid = |msg: String| Err(ModelError::InvalidTopology(msg));

        let mut routed_reservoirs = vec![false; reservoir_names.len()];
        let mut routed_districts = vec![false; district_names.len()];
        let mut consumed_releases = HashSet::new();
        let mut consumed_leftovers = HashSet::new();
        let mut delay_for_district = vec![None; district_names.len()];
        let mut buffer_count = 0;
        let mut nodes = Vec::with_capacity(routing.len());

        for node in routing {
            let mut sources = Vec::with_capacity(node.inflows.len());
            let mut lagged = false;

            for source in &node.inflows {
                let lag = source.lag();
                if lag > 1 {
                    return invalid(format!(
                        "node '{}': lag must be 0 or 1, got {}",
                        node.name, lag
                    ));
                }
                lagged |= lag == 1;

                let resolved = match source {
                    FlowSource::Catchment { name, lag } => {
                        let index = position(catchment_names, name).ok_or_else(|| {
                            ModelError::UnknownEntity(format!("catchment '{}'", name))
                        })?;
                        ResolvedSource::Catchment {
                            index,
                            lagged: *lag == 1,
                        }
                    }
                    FlowSource::Release { reservoir } => {
                        let index = position(reservoir_names, reservoir).ok_or_else(|| {
                            ModelError::UnknownEntity(format!("reservoir '{}'", reservoir))
                        })?;
                        if !routed_reservoirs[index] {
                            return invalid(format!(
                                "node '{}' reads release of '{}' before it is routed",
                                node.name, reservoir
                            ));
                        }
                        if !consumed_releases.insert(index) {
                            return invalid(format!(
                                "release of '{}' feeds more than one node",
                                reservoir
                            ));
                        }
                        ResolvedSource::Release { reservoir: index }
                    }
                    FlowSource::Leftover { district, lag } => {
                        let index = position(district_names, district).ok_or_else(|| {
                            ModelError::UnknownEntity(format!("irrigation district '{}'", district))
                        })?;
                        if !routed_districts[index] {
                            return invalid(format!(
                                "node '{}' reads leftover of '{}' before it is routed",
                                node.name, district
                            ));
                        }
                        if !consumed_leftovers.insert(index) {
                            return invalid(format!(
                                "leftover of '{}' feeds more than one node",
                                district
                            ));
                        }
                        if *lag == 1 {
                            let buffer = buffer_count;
                            buffer_count += 1;
                            delay_for_district[index] = Some(buffer);
                            ResolvedSource::DelayedLeftover { buffer }
                        } else {
                            ResolvedSource::Leftover { district: index }
                        }
                    }
                };
                sources.push(resolved);
            }

            if let Some(warmup) = node.warmup_inflow {
                if !warmup.is_finite() || warmup < 0.0 {
                    return invalid(format!(
                        "node '{}': warmup_inflow must be finite and >= 0",
                        node.name
                    ));
                }
            }

            let target = match node.kind {
                NodeKind::Reservoir => {
                    let index = position(reservoir_names, &node.name).ok_or_else(|| {
                        ModelError::UnknownEntity(format!("reservoir '{}'", node.name))
                    })?;
                    if std::mem::replace(&mut routed_reservoirs[index], true) {
                        return invalid(format!("reservoir '{}' routed twice", node.name));
                    }
                    NodeTarget::Reservoir(index)
                }
                NodeKind::Irrigation => {
                    let index = position(district_names, &node.name).ok_or_else(|| {
                        ModelError::UnknownEntity(format!("irrigation district '{}'", node.name))
                    })?;
                    if std::mem::replace(&mut routed_districts[index], true) {
                        return invalid(format!("irrigation district '{}' routed twice", node.name));
                    }
                    NodeTarget::Irrigation(index)
                }
            };

            nodes.push(ResolvedNode {
                target,
                sources,
                lagged,
                warmup_inflow: node.warmup_inflow,
            });
        }

        if let Some(i) = routed_reservoirs.iter().position(|routed| !routed) {
            return invalid(format!("reservoir '{}' is never routed", reservoir_names[i]));
        }
        if let Some(i) = routed_districts.iter().position(|routed| !routed) {
            return invalid(format!(
                "irrigation district '{}' is never routed",
                district_names[i]
            ));
        }

        Ok(Self {
            nodes,
            delay_for_district,
            buffer_count,
        })
    }
}

//! Nelson run rules for detecting non-random patterns on a control chart.
//!
//! Every rule is an independent sliding-window scan over the time-ordered
//! values. A scan is a lazy iterator that borrows the values, holds no shared
//! state and can be cloned to restart it. [`NelsonDetector`] runs all eight
//! scans and concatenates their findings in rule order, then by window start.
//!
//! Zones come from the control limits: `s = (ucl - cl) / 3`, Zone B boundary
//! at `cl ± s` and Zone A boundary at `cl ± 2s`.

use crate::analytics::control_limits::{ControlLimits, Zones};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::statistics::ensure_finite;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this many points no rule is evaluated
pub const MIN_NELSON_SAMPLES: usize = 9;

/// The eight Nelson rules, numbered as in the literature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum NelsonRule {
    /// One point beyond the control limits
    BeyondLimits = 1,
    /// 9 points in a row on the same side of the center line
    NineSameSide = 2,
    /// 6 points in a row steadily increasing or decreasing
    SixTrend = 3,
    /// 14 points in a row alternating up and down
    FourteenAlternating = 4,
    /// 2 points in a row beyond Zone A on the same side
    TwoBeyondZoneA = 5,
    /// 4 points in a row beyond Zone B on the same side
    FourBeyondZoneB = 6,
    /// 15 points in a row inside Zone C
    FifteenWithinZoneC = 7,
    /// 8 points in a row outside Zone C on either side
    EightOutsideZoneC = 8,
}

impl NelsonRule {
    /// Evaluation order
    pub const ALL: [NelsonRule; 8] = [
        NelsonRule::BeyondLimits,
        NelsonRule::NineSameSide,
        NelsonRule::SixTrend,
        NelsonRule::FourteenAlternating,
        NelsonRule::TwoBeyondZoneA,
        NelsonRule::FourBeyondZoneB,
        NelsonRule::FifteenWithinZoneC,
        NelsonRule::EightOutsideZoneC,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> String {
        format!("Nelson Rule {}", self.id())
    }

    pub fn description(self) -> &'static str {
        match self {
            NelsonRule::BeyondLimits => "One point beyond the control limits",
            NelsonRule::NineSameSide => "9 consecutive points on the same side of the center line",
            NelsonRule::SixTrend => "6 consecutive points steadily increasing or decreasing",
            NelsonRule::FourteenAlternating => "14 consecutive points alternating up and down",
            NelsonRule::TwoBeyondZoneA => {
                "2 consecutive points beyond 2 sigma on the same side (Zone A)"
            }
            NelsonRule::FourBeyondZoneB => {
                "4 consecutive points beyond 1 sigma on the same side (Zone B)"
            }
            NelsonRule::FifteenWithinZoneC => "15 consecutive points within 1 sigma (Zone C)",
            NelsonRule::EightOutsideZoneC => "8 consecutive points outside 1 sigma (Zone C)",
        }
    }

    /// Number of consecutive points the rule inspects
    pub fn window(self) -> usize {
        match self {
            NelsonRule::BeyondLimits => 1,
            NelsonRule::NineSameSide => 9,
            NelsonRule::SixTrend => 6,
            NelsonRule::FourteenAlternating => 14,
            NelsonRule::TwoBeyondZoneA => 2,
            NelsonRule::FourBeyondZoneB => 4,
            NelsonRule::FifteenWithinZoneC => 15,
            NelsonRule::EightOutsideZoneC => 8,
        }
    }

    /// Run this rule's scan to completion
    pub fn findings(self, values: &[f64], zones: Zones) -> Vec<PatternFinding> {
        match self {
            NelsonRule::BeyondLimits => beyond_limits(values, zones).collect(),
            NelsonRule::NineSameSide => nine_same_side(values, zones).collect(),
            NelsonRule::SixTrend => six_trend(values).collect(),
            NelsonRule::FourteenAlternating => fourteen_alternating(values).collect(),
            NelsonRule::TwoBeyondZoneA => two_beyond_zone_a(values, zones).collect(),
            NelsonRule::FourBeyondZoneB => four_beyond_zone_b(values, zones).collect(),
            NelsonRule::FifteenWithinZoneC => fifteen_within_zone_c(values, zones).collect(),
            NelsonRule::EightOutsideZoneC => eight_outside_zone_c(values, zones).collect(),
        }
    }
}

impl fmt::Display for NelsonRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<NelsonRule> for u8 {
    fn from(rule: NelsonRule) -> Self {
        rule.id()
    }
}

impl TryFrom<u8> for NelsonRule {
    type Error = AnalyticsError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        NelsonRule::ALL
            .into_iter()
            .find(|rule| rule.id() == id)
            .ok_or(AnalyticsError::UnknownRule(id))
    }
}

/// One place where a rule fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFinding {
    pub rule: NelsonRule,
    pub description: String,

    /// Index of the offending point (rule 1) or of the window start
    pub position: usize,

    /// Window length, for run rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// Offending value, for rule 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl PatternFinding {
    fn point(rule: NelsonRule, position: usize, value: f64) -> Self {
        Self {
            rule,
            description: rule.description().to_string(),
            position,
            length: None,
            value: Some(value),
        }
    }

    fn run(rule: NelsonRule, position: usize) -> Self {
        Self {
            rule,
            description: rule.description().to_string(),
            position,
            length: Some(rule.window()),
            value: None,
        }
    }

    /// Index of the point that completed the pattern
    pub fn last_index(&self) -> usize {
        self.position + self.length.unwrap_or(1) - 1
    }
}

/// Yield a run finding for every window of `rule.window()` points matching `predicate`
fn windowed<'a, P>(
    values: &'a [f64],
    rule: NelsonRule,
    predicate: P,
) -> impl Iterator<Item = PatternFinding> + Clone + 'a
where
    P: Fn(&[f64]) -> bool + Clone + 'a,
{
    values
        .windows(rule.window())
        .enumerate()
        .filter(move |&(_, window)| predicate(window))
        .map(move |(start, _)| PatternFinding::run(rule, start))
}

/// Rule 1: a point above `ucl` or below `lcl`
pub fn beyond_limits(values: &[f64], zones: Zones) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    values
        .iter()
        .enumerate()
        .filter(move |&(_, &value)| value > zones.upper || value < zones.lower)
        .map(|(index, &value)| PatternFinding::point(NelsonRule::BeyondLimits, index, value))
}

/// Rule 2: 9 points all above or all below the center line
pub fn nine_same_side(values: &[f64], zones: Zones) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    let cl = zones.center;
    windowed(values, NelsonRule::NineSameSide, move |w| {
        w.iter().all(|&v| v > cl) || w.iter().all(|&v| v < cl)
    })
}

/// Rule 3: 6 points strictly increasing or strictly decreasing
pub fn six_trend(values: &[f64]) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    windowed(values, NelsonRule::SixTrend, |w| {
        w.windows(2).all(|p| p[0] < p[1]) || w.windows(2).all(|p| p[0] > p[1])
    })
}

/// Rule 4: 14 points whose every step reverses the previous one
///
/// A step counts as "up" only when strictly increasing; a flat step counts as "down".
pub fn fourteen_alternating(values: &[f64]) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    windowed(values, NelsonRule::FourteenAlternating, |w| {
        w.windows(3).all(|t| (t[0] < t[1]) != (t[1] < t[2]))
    })
}

/// Rule 5: 2 points both beyond `cl + 2s`, or both beyond `cl - 2s`
pub fn two_beyond_zone_a(values: &[f64], zones: Zones) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    let (upper, lower) = (zones.zone_a_upper(), zones.zone_a_lower());
    windowed(values, NelsonRule::TwoBeyondZoneA, move |w| {
        w.iter().all(|&v| v > upper) || w.iter().all(|&v| v < lower)
    })
}

/// Rule 6: 4 points all beyond `cl + s`, or all beyond `cl - s`
pub fn four_beyond_zone_b(values: &[f64], zones: Zones) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    let (upper, lower) = (zones.zone_b_upper(), zones.zone_b_lower());
    windowed(values, NelsonRule::FourBeyondZoneB, move |w| {
        w.iter().all(|&v| v > upper) || w.iter().all(|&v| v < lower)
    })
}

/// Rule 7: 15 points strictly inside `(cl - s, cl + s)`
pub fn fifteen_within_zone_c(values: &[f64], zones: Zones) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    let (upper, lower) = (zones.zone_b_upper(), zones.zone_b_lower());
    windowed(values, NelsonRule::FifteenWithinZoneC, move |w| {
        w.iter().all(|&v| lower < v && v < upper)
    })
}

/// Rule 8: 8 points strictly outside `[cl - s, cl + s]`, sides may mix
pub fn eight_outside_zone_c(values: &[f64], zones: Zones) -> impl Iterator<Item = PatternFinding> + Clone + '_ {
    let (upper, lower) = (zones.zone_b_upper(), zones.zone_b_lower());
    windowed(values, NelsonRule::EightOutsideZoneC, move |w| {
        w.iter().all(|&v| v < lower || v > upper)
    })
}

/// Runs all eight rules over a sample
#[derive(Debug, Clone, Copy)]
pub struct NelsonDetector {
    min_samples: usize,
}

impl Default for NelsonDetector {
    fn default() -> Self {
        Self {
            min_samples: MIN_NELSON_SAMPLES,
        }
    }
}

impl NelsonDetector {
    pub fn new(min_samples: usize) -> Self {
        Self { min_samples }
    }

    /// All findings, in rule order then window start; empty when the sample
    /// is too short or the limits are not computable
    pub fn detect(&self, values: &[f64], limits: &ControlLimits) -> AnalyticsResult<Vec<PatternFinding>> {
        ensure_finite(values)?;

        let Some(zones) = limits.zones() else {
            return Ok(Vec::new());
        };
        if values.len() < self.min_samples {
            return Ok(Vec::new());
        }

        let findings: Vec<PatternFinding> = NelsonRule::ALL
            .into_iter()
            .flat_map(|rule| rule.findings(values, zones))
            .collect();

        if !findings.is_empty() {
            tracing::debug!(
                samples = values.len(),
                findings = findings.len(),
                "Nelson rule patterns detected"
            );
        }

        Ok(findings)
    }
}

/// Detect patterns with the default minimum sample size
pub fn detect_nelson_rules(values: &[f64], limits: &ControlLimits) -> AnalyticsResult<Vec<PatternFinding>> {
    NelsonDetector::default().detect(values, limits)
}

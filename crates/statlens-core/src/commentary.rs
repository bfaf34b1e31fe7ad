//! Canned threshold observations over derived metrics.

use serde::Serialize;

use crate::metrics::DerivedMetrics;
use crate::reconcile::Reconciliation;

const STRONG_REVENUE_GROWTH: f64 = 50.0;
const HEALTHY_MARGIN: f64 = 20.0;
const MODERATE_MARGIN: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    RevenueGrowth,
    OperatingMargin,
    EpsTrend,
    Profitability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub topic: Topic,
    pub tone: Tone,
    pub message: String,
}

impl Observation {
    fn new(topic: Topic, tone: Tone, message: String) -> Self {
        Self {
            topic,
            tone,
            message,
        }
    }
}

pub fn observe(reconciliation: &Reconciliation, metrics: &DerivedMetrics) -> Vec<Observation> {
    let mut observations = Vec::with_capacity(4);
    let window = metrics.periods.len();

    let revenue_growth = metrics.summary.revenue_percent;
    let (tone, message) = if revenue_growth >= STRONG_REVENUE_GROWTH {
        (
            Tone::Positive,
            format!("Strong revenue growth of {revenue_growth:.1}% over the last {window} periods."),
        )
    } else if revenue_growth > 0.0 {
        (
            Tone::Positive,
            format!("Revenue grew {revenue_growth:.1}% over the last {window} periods."),
        )
    } else if revenue_growth < 0.0 {
        (
            Tone::Negative,
            format!("Revenue declined {:.1}% over the last {window} periods.", revenue_growth.abs()),
        )
    } else {
        (
            Tone::Neutral,
            format!("Revenue was flat over the last {window} periods."),
        )
    };
    observations.push(Observation::new(Topic::RevenueGrowth, tone, message));

    let latest_margin = metrics.latest().and_then(|latest| latest.opm_percent);
    let (tone, message) = match latest_margin {
        Some(margin) if margin >= HEALTHY_MARGIN => (
            Tone::Positive,
            format!("Healthy operating margin of {margin:.1}% in the latest period."),
        ),
        Some(margin) if margin >= MODERATE_MARGIN => (
            Tone::Neutral,
            format!("Moderate operating margin of {margin:.1}% in the latest period."),
        ),
        Some(margin) => (
            Tone::Negative,
            format!("Thin operating margin of {margin:.1}% in the latest period."),
        ),
        None => (
            Tone::Neutral,
            String::from("Operating margin is not available for the latest period."),
        ),
    };
    observations.push(Observation::new(Topic::OperatingMargin, tone, message));

    if let Some(latest) = metrics.latest() {
        let growth = latest.eps_growth_percent;
        let (tone, message) = if growth > 0.0 {
            (
                Tone::Positive,
                format!("EPS improved {growth:.1}% versus the previous period."),
            )
        } else if growth < 0.0 {
            (
                Tone::Negative,
                format!("EPS declined {:.1}% versus the previous period.", growth.abs()),
            )
        } else {
            (
                Tone::Neutral,
                String::from("EPS was flat versus the previous period."),
            )
        };
        observations.push(Observation::new(Topic::EpsTrend, tone, message));
    }

    if let Some(record) = reconciliation.records.last() {
        if record.pat < 0.0 {
            observations.push(Observation::new(
                Topic::Profitability,
                Tone::Negative,
                format!("The company reported a net loss in {}.", record.label),
            ));
        }
    }

    observations
}

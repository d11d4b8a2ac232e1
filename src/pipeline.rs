// One recomputation pass: filter the loaded table, then aggregate.
//
// Pure function of (dataset, selection). The presentation layer calls it
// again after every selection change.
use crate::aggregate::{demographics, summarize, top_categories};
use crate::filter::{apply, FilterSelection};
use crate::types::{AggregateResult, Dataset, DemographicSummary, RankedEntry, Record};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub summary: AggregateResult,
    pub ranking: Vec<RankedEntry>,
    pub demographics: DemographicSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    /// The selection matched no rows. Metrics and charts are withheld.
    Empty,
    Populated(Metrics),
}

#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    pub filtered: Vec<&'a Record>,
    pub outcome: ViewOutcome,
}

impl<'a> DashboardView<'a> {
    pub fn is_empty(&self) -> bool {
        matches!(self.outcome, ViewOutcome::Empty)
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        match &self.outcome {
            ViewOutcome::Populated(m) => Some(m),
            ViewOutcome::Empty => None,
        }
    }
}

pub fn evaluate<'a>(dataset: &'a Dataset, selection: &FilterSelection, top_n: usize) -> DashboardView<'a> {
    let filtered = apply(&dataset.records, selection);
    if filtered.is_empty() {
        warn!(selection = %selection, "Selection matched no rows");
        return DashboardView { filtered, outcome: ViewOutcome::Empty };
    }

    let metrics = Metrics {
        summary: summarize(&filtered),
        ranking: top_categories(&filtered, top_n),
        demographics: demographics(dataset, &filtered),
    };
    debug!(
        rows = filtered.len(),
        total_sales = metrics.summary.total_sales,
        "Dashboard recomputed"
    );
    DashboardView { filtered, outcome: ViewOutcome::Populated(metrics) }
}

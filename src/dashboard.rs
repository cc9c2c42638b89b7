//! One recomputation pass: filter the table, then run every aggregator.

use serde::Serialize;

use crate::{
    aggregate::{self, DEFAULT_TOP_SKUS, Kpis, SalesmanTotal, Share, SkuRank, TrendPoint},
    columns::Dimension,
    filter::{self, Criteria, SkuCriteria},
    loader::SalesTable,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub rows: usize,
    pub kpis: Kpis,
    pub category_share: Share,
    pub channel_share: Share,
    pub monthly_trend: Vec<TrendPoint>,
    pub salesman_performance: Vec<SalesmanTotal>,
    pub fast_moving_skus: Vec<SkuRank>,
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Everything a single interaction needs to produce a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardRequest {
    pub criteria: Criteria,
    pub sku: SkuCriteria,
    /// Fast-moving SKU limit; `0` keeps every SKU.
    pub top: usize,
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self {
            criteria: Criteria::default(),
            sku: SkuCriteria::default(),
            top: DEFAULT_TOP_SKUS,
        }
    }
}

pub fn compute(table: &SalesTable, request: &DashboardRequest) -> DashboardView {
    let view = filter::apply(table, &request.criteria);
    let sku_view = filter::apply(table, &request.sku.to_criteria());
    DashboardView {
        rows: view.len(),
        kpis: aggregate::kpis(&view),
        category_share: aggregate::share_by(&view, Dimension::Category),
        channel_share: aggregate::share_by(&view, Dimension::Channel),
        monthly_trend: aggregate::monthly_trend(&view),
        salesman_performance: aggregate::salesman_performance(&view),
        fast_moving_skus: aggregate::fast_moving_skus(&sku_view, request.top),
    }
}

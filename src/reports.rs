use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::client::ApiClient;
use crate::error::ApiError;

pub const REPORTS_ENDPOINT: &str = "/reports/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl ReportPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Yearly => "yearly",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parallel label/value series, ready to plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<Decimal>,
}

impl Chart {
    /// Label/value pairs; a length mismatch is cut to the shorter side.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Decimal)> + '_ {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().copied())
    }

    pub fn total(&self) -> Decimal {
        self.data.iter().copied().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub revenue: Decimal,
    /// Inbound value minus outbound value
    pub asset_change: Decimal,
    #[serde(default)]
    pub date_info: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Outbound kilograms per product
    pub pie_chart: Chart,
    /// Outbound kilograms per time bucket
    pub bar_chart: Chart,
    #[serde(default)]
    pub pie_chart_in: Chart,
    #[serde(default)]
    pub bar_chart_in: Chart,
    pub summary: ReportSummary,
}

pub async fn fetch(client: &ApiClient, period: ReportPeriod) -> Result<Report, ApiError> {
    let path = format!("{}?period={}", REPORTS_ENDPOINT, period);
    client.get(&path).await.map_err(|e| {
        tracing::error!("Failed to load {} report: {}", period, e);
        e
    })
}

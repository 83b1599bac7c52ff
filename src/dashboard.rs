use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::inventory::StockMovement;

pub const DASHBOARD_ENDPOINT: &str = "/dashboard/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowestStock {
    pub name: String,
    pub stock: Decimal,
}

/// Warehouse totals as computed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Sum of weight times price over every product
    pub total_asset: Decimal,
    /// Total kilograms in stock
    pub total_stock: Decimal,
    pub lowest_stock_item: LowestStock,
    /// Outbound value for the current calendar month
    pub income_month: Decimal,
    #[serde(default)]
    pub recent_in: Vec<StockMovement>,
    #[serde(default)]
    pub recent_out: Vec<StockMovement>,
}

pub async fn fetch(client: &ApiClient) -> Result<Dashboard, ApiError> {
    client.get(DASHBOARD_ENDPOINT).await.map_err(|e| {
        tracing::error!("Failed to load dashboard: {}", e);
        e
    })
}

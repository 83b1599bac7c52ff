use crate::app::App;
use crate::cli::table::render;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::gate::Screen;
use crate::inventory::StockIn;

pub async fn handle(app: &App, output_format: OutputFormat) -> anyhow::Result<()> {
    require(app, Screen::Dashboard)?;
    let dashboard = app.dashboard().await?;

    output_value(&output_format, &dashboard, || {
        let mut out = vec![
            format!("Total asset:   {}", dashboard.total_asset),
            format!("Total stock:   {} kg", dashboard.total_stock),
            format!(
                "Lowest stock:  {} ({} kg)",
                dashboard.lowest_stock_item.name, dashboard.lowest_stock_item.stock
            ),
            format!("Income (month): {}", dashboard.income_month),
        ];
        // Same columns for both ledgers
        let recent = |title: &str, rows: &[crate::inventory::StockMovement]| {
            let rows: Vec<StockIn> = rows.iter().cloned().map(StockIn).collect();
            if rows.is_empty() {
                format!("\n{}: none", title)
            } else {
                format!("\n{}:\n{}", title, render(&rows))
            }
        };
        out.push(recent("Recent stock in", &dashboard.recent_in));
        out.push(recent("Recent stock out", &dashboard.recent_out));
        out.join("\n")
    })
}

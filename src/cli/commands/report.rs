use crate::app::App;
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::gate::Screen;
use crate::reports::{Chart, ReportPeriod};

fn chart_lines(title: &str, chart: &Chart) -> String {
    let total = chart.total();
    let mut lines = vec![format!("{} (total {}):", title, total)];
    if chart.labels.is_empty() {
        lines.push("  no data".to_string());
    }
    for (label, value) in chart.entries() {
        lines.push(format!("  {:<20} {}", label, value));
    }
    lines.join("\n")
}

pub async fn handle(period: ReportPeriod, app: &App, output_format: OutputFormat) -> anyhow::Result<()> {
    require(app, Screen::Reports)?;
    let report = app.report(period).await?;

    output_value(&output_format, &report, || {
        let summary = &report.summary;
        [
            format!("Report: {} {}", period, summary.date_info).trim_end().to_string(),
            format!("Total in:      {} kg", summary.total_in),
            format!("Total out:     {} kg", summary.total_out),
            format!("Revenue:       {}", summary.revenue),
            format!("Asset change:  {}", summary.asset_change),
            String::new(),
            chart_lines("Outbound by product", &report.pie_chart),
            chart_lines("Outbound over time", &report.bar_chart),
            chart_lines("Inbound by product", &report.pie_chart_in),
            chart_lines("Inbound over time", &report.bar_chart_in),
        ]
        .join("\n")
    })
}

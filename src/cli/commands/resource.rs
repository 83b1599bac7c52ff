use clap::Subcommand;
use serde_json::json;

use crate::app::App;
use crate::cli::table::{page_footer, render, TableRow};
use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::gate::Action;
use crate::inventory::Dated;
use crate::resource::{ResourceController, ResourceError};

#[derive(Subcommand)]
pub enum ResourceCommands {
    #[command(about = "List rows, filtered and paginated")]
    List {
        #[arg(long, short, help = "Case-insensitive search text")]
        search: Option<String>,
        #[arg(long, default_value_t = 1, help = "Page number")]
        page: usize,
        #[arg(long, help = "Rows per page")]
        per_page: Option<usize>,
    },

    #[command(about = "Show one row")]
    Show {
        #[arg(help = "Row ID")]
        id: i64,
    },

    #[command(about = "Create a row from --data or stdin JSON")]
    Create {
        #[arg(long, help = "JSON object with the draft fields")]
        data: Option<String>,
        #[arg(long, short, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "Update a row; the JSON only needs the changed fields")]
    Update {
        #[arg(help = "Row ID")]
        id: i64,
        #[arg(long, help = "JSON object with the fields to change")]
        data: Option<String>,
        #[arg(long, short, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "Delete a row")]
    Delete {
        #[arg(help = "Row ID")]
        id: i64,
        #[arg(long, short, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

/// Ledger screens add a month filter to the usual row commands.
#[derive(Subcommand)]
pub enum LedgerCommands {
    #[command(flatten)]
    Rows(ResourceCommands),

    #[command(about = "All rows dated in a calendar month, for printing")]
    Month {
        #[arg(help = "Month number, 1-12", value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
}

/// Prefer the notice the controller raised over the bare error.
fn failure<R: TableRow>(controller: &ResourceController<R>, err: ResourceError) -> anyhow::Error {
    match controller.notice() {
        Some(notice) if notice.is_blocking() => anyhow::anyhow!(notice.message),
        _ => err.into(),
    }
}

pub async fn handle<R: TableRow>(cmd: ResourceCommands, app: &App, output_format: OutputFormat) -> anyhow::Result<()> {
    require(app, R::SCREEN)?;
    let controller = app.controller::<R>();

    match cmd {
        ResourceCommands::List { search, page, per_page } => {
            controller.load().await?;
            if let Some(size) = per_page {
                controller.set_page_size(size);
            }
            if let Some(term) = search {
                controller.set_search(term);
            }
            controller.set_page(page);

            let page = controller.visible();
            if page.match_count == 0 {
                return output_empty_collection(&output_format, R::ENDPOINT.trim_matches('/'), "No rows found");
            }
            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "rows": page.rows,
                        "page": page.page,
                        "page_size": page.page_size,
                        "total_pages": page.total_pages,
                        "match_count": page.match_count,
                    }))?
                ),
                OutputFormat::Text => {
                    println!("{}", render(&page.rows));
                    println!();
                    println!("{}", page_footer(&page));
                }
            }
            Ok(())
        }
        ResourceCommands::Show { id } => {
            controller.load().await?;
            let row = controller
                .find(id)
                .ok_or(ResourceError::UnknownRow { noun: R::NOUN, id })?;
            output_value(&output_format, &row, || {
                R::HEADERS
                    .iter()
                    .zip(row.cells())
                    .map(|(header, cell)| format!("{:<14} {}", format!("{}:", header), cell))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ResourceCommands::Create { data, yes } => {
            require(app, Action::Create(R::SCREEN))?;
            let patch = read_json_input(data)?;
            // Reference rows feed the pre-submit checks
            controller.load().await?;

            controller.open_create();
            let draft = merge_draft(&R::empty_draft(), patch)?;
            controller.set_draft(draft);
            submit_and_confirm(&controller, yes, &output_format).await
        }
        ResourceCommands::Update { id, data, yes } => {
            require(app, Action::Edit(R::SCREEN))?;
            let patch = read_json_input(data)?;
            controller.load().await?;

            controller.open_edit(id)?;
            let current = controller
                .form()
                .draft()
                .cloned()
                .ok_or(ResourceError::NothingPending(R::NOUN))?;
            controller.set_draft(merge_draft(&current, patch)?);
            submit_and_confirm(&controller, yes, &output_format).await
        }
        ResourceCommands::Delete { id, yes } => {
            require(app, Action::Delete(R::SCREEN))?;
            controller.load().await?;

            let prompt = controller.request_delete(id)?;
            if !confirm(&prompt, yes)? {
                controller.cancel_confirm();
                return output_success(&output_format, "Cancelled", None);
            }
            controller
                .confirm_delete()
                .await
                .map_err(|e| failure(&controller, e))?;
            finish(&controller, &output_format, json!({ "id": id }))
        }
    }
}

pub async fn handle_ledger<R: TableRow + Dated>(
    cmd: LedgerCommands,
    app: &App,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        LedgerCommands::Rows(cmd) => handle::<R>(cmd, app, output_format).await,
        LedgerCommands::Month { month } => {
            require(app, R::SCREEN)?;
            let controller = app.controller::<R>();
            controller.load().await?;

            let rows = controller.rows_in_month(month);
            if rows.is_empty() {
                return output_empty_collection(
                    &output_format,
                    R::ENDPOINT.trim_matches('/'),
                    &format!("No transactions in month {}", month),
                );
            }
            output_value(&output_format, &json!({ "month": month, "rows": rows }), || {
                render(&rows)
            })
        }
    }
}

async fn submit_and_confirm<R: TableRow>(
    controller: &ResourceController<R>,
    yes: bool,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let summary = controller.submit().map_err(|e| failure(controller, e))?;
    if !confirm(&summary, yes)? {
        controller.cancel_confirm();
        controller.close();
        return output_success(output_format, "Cancelled", None);
    }

    controller.confirm().await.map_err(|e| failure(controller, e))?;
    finish(controller, output_format, json!({}))
}

fn finish<R: TableRow>(
    controller: &ResourceController<R>,
    output_format: &OutputFormat,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    let message = controller
        .notice()
        .map(|notice| notice.message)
        .unwrap_or_else(|| "Done".to_string());
    controller.acknowledge();
    output_success(output_format, &message, Some(data))
}

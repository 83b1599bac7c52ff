use crate::gate::Screen;
use crate::inventory::{Category, Product, StockIn, StockMovement, StockOut};
use crate::resource::{Page, Resource};
use crate::users::ManagedUser;

/// How a resource renders as a text table, and which screen it lives on.
pub trait TableRow: Resource {
    const SCREEN: Screen;
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl TableRow for Category {
    const SCREEN: Screen = Screen::Categories;
    const HEADERS: &'static [&'static str] = &["ID", "NAME"];

    fn cells(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone()]
    }
}

impl TableRow for Product {
    const SCREEN: Screen = Screen::Products;
    const HEADERS: &'static [&'static str] =
        &["ID", "NAME", "CATEGORY", "COLOR", "WEIGHT (KG)", "PRICE/KG", "TOTAL VALUE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.category_name.clone(),
            self.color.clone().unwrap_or_else(|| "-".to_string()),
            self.weight.to_string(),
            self.price_per_kg.to_string(),
            self.total_value().to_string(),
        ]
    }
}

const MOVEMENT_HEADERS: &[&str] = &["ID", "DATE", "PRODUCT", "QUANTITY (KG)", "NOTES"];

fn movement_cells(row: &StockMovement) -> Vec<String> {
    vec![
        row.id.to_string(),
        row.date.to_string(),
        row.product_name.clone(),
        row.quantity.to_string(),
        row.notes.clone().unwrap_or_default(),
    ]
}

impl TableRow for StockIn {
    const SCREEN: Screen = Screen::StockIn;
    const HEADERS: &'static [&'static str] = MOVEMENT_HEADERS;

    fn cells(&self) -> Vec<String> {
        movement_cells(self)
    }
}

impl TableRow for StockOut {
    const SCREEN: Screen = Screen::StockOut;
    const HEADERS: &'static [&'static str] = MOVEMENT_HEADERS;

    fn cells(&self) -> Vec<String> {
        movement_cells(self)
    }
}

impl TableRow for ManagedUser {
    const SCREEN: Screen = Screen::Users;
    const HEADERS: &'static [&'static str] = &["ID", "USERNAME", "FULL NAME", "EMAIL", "ROLE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.username.clone(),
            self.full_name.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            self.role.to_string(),
        ]
    }
}

/// Render rows under a header, columns padded to their widest cell.
pub fn render<R: TableRow>(rows: &[R]) -> String {
    let body: Vec<Vec<String>> = rows.iter().map(R::cells).collect();
    let mut widths: Vec<usize> = R::HEADERS.iter().map(|h| h.chars().count()).collect();
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(line(R::HEADERS.iter().map(|h| h.to_string()).collect()));
    out.push("-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.extend(body.into_iter().map(line));
    out.join("\n")
}

/// Footer such as `Page 2 of 3 (23 matches)`.
pub fn page_footer<T>(page: &Page<T>) -> String {
    format!(
        "Page {} of {} ({} match{})",
        page.page,
        page.total_pages.max(1),
        page.match_count,
        if page.match_count == 1 { "" } else { "es" }
    )
}

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::ops::Deref;

use super::Product;
use crate::error::ValidationError;
use crate::resource::{DraftContext, FormMode, Resource, ResourceController};

/// One stock movement row, shared by the inbound and outbound ledgers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product: i64,
    #[serde(default)]
    pub product_name: String,
    pub date: NaiveDate,
    pub quantity: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockIn(pub StockMovement);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockOut(pub StockMovement);

impl Deref for StockIn {
    type Target = StockMovement;

    fn deref(&self) -> &StockMovement {
        &self.0
    }
}

impl Deref for StockOut {
    type Target = StockMovement;

    fn deref(&self) -> &StockMovement {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub product: Option<i64>,
    pub date: Option<NaiveDate>,
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

impl MovementDraft {
    /// Blank form dated today.
    pub fn today() -> Self {
        Self {
            date: Some(Local::now().date_naive()),
            ..Self::default()
        }
    }
}

impl From<&StockMovement> for MovementDraft {
    fn from(row: &StockMovement) -> Self {
        Self {
            product: Some(row.product),
            date: Some(row.date),
            quantity: Some(row.quantity),
            notes: row.notes.clone().unwrap_or_default(),
        }
    }
}

fn check_required(draft: &MovementDraft) -> Result<(NaiveDate, i64, Decimal), ValidationError> {
    let (Some(date), Some(product), Some(quantity)) = (draft.date, draft.product, draft.quantity) else {
        return Err(ValidationError::new(
            "quantity",
            "date, product and quantity are required",
        ));
    };
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::new("quantity", "quantity must be greater than zero"));
    }
    Ok((date, product, quantity))
}

/// Advisory stock check for an outbound movement against the cached product
/// weight. When editing a row that already took stock from the same product,
/// that quantity counts as available again. Unknown products pass: the server
/// has the final say.
fn check_stock(
    product: i64,
    quantity: Decimal,
    products: &[Product],
    original: Option<&StockMovement>,
) -> Result<(), ValidationError> {
    let Some(cached) = products.iter().find(|p| p.id == product) else {
        return Ok(());
    };
    let returned = original
        .filter(|row| row.product == product)
        .map(|row| row.quantity)
        .unwrap_or_default();
    let available = cached.weight + returned;
    if quantity > available {
        return Err(ValidationError::new(
            "quantity",
            format!(
                "not enough stock: {} kg left of {}, {} kg requested",
                available, cached.name, quantity
            ),
        ));
    }
    Ok(())
}

fn movement_summary(verb: &str, draft: &MovementDraft, products: &[Product]) -> String {
    let product = draft
        .product
        .map(|id| {
            products
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| format!("product #{}", id))
        })
        .unwrap_or_else(|| "-".to_string());
    let date = draft.date.map(|d| d.to_string()).unwrap_or_default();
    format!(
        "{} {} kg of {} on {}?",
        verb,
        draft.quantity.unwrap_or_default(),
        product,
        date
    )
}

fn movement_payload(draft: &MovementDraft) -> Value {
    json!({
        "product": draft.product,
        "date": draft.date,
        "quantity": draft.quantity,
        "notes": draft.notes.trim(),
    })
}

fn movement_search_text(row: &StockMovement) -> Vec<Cow<'_, str>> {
    vec![
        Cow::Borrowed(row.product_name.as_str()),
        Cow::Owned(row.date.to_string()),
    ]
}

impl Resource for StockIn {
    type Draft = MovementDraft;
    type Reference = Product;

    const ENDPOINT: &'static str = "/transactions-in/";
    const REFERENCE_ENDPOINT: Option<&'static str> = Some(Product::ENDPOINT);
    const NOUN: &'static str = "inbound transaction";

    fn id(&self) -> i64 {
        self.id
    }

    fn search_text(&self) -> Vec<Cow<'_, str>> {
        movement_search_text(&self.0)
    }

    fn label(&self) -> String {
        format!("{} +{} kg ({})", self.product_name, self.quantity, self.date)
    }

    fn to_draft(&self) -> MovementDraft {
        MovementDraft::from(&self.0)
    }

    fn empty_draft() -> MovementDraft {
        MovementDraft::today()
    }

    fn validate(draft: &MovementDraft, _ctx: &DraftContext<'_, Self>) -> Result<(), ValidationError> {
        check_required(draft).map(|_| ())
    }

    fn summary(draft: &MovementDraft, ctx: &DraftContext<'_, Self>) -> String {
        movement_summary("Receive", draft, ctx.reference)
    }

    fn payload(draft: &MovementDraft, _mode: FormMode) -> Result<Value, serde_json::Error> {
        Ok(movement_payload(draft))
    }
}

impl Resource for StockOut {
    type Draft = MovementDraft;
    type Reference = Product;

    const ENDPOINT: &'static str = "/transactions-out/";
    const REFERENCE_ENDPOINT: Option<&'static str> = Some(Product::ENDPOINT);
    const NOUN: &'static str = "outbound transaction";

    fn id(&self) -> i64 {
        self.id
    }

    fn search_text(&self) -> Vec<Cow<'_, str>> {
        movement_search_text(&self.0)
    }

    fn label(&self) -> String {
        format!("{} -{} kg ({})", self.product_name, self.quantity, self.date)
    }

    fn to_draft(&self) -> MovementDraft {
        MovementDraft::from(&self.0)
    }

    fn empty_draft() -> MovementDraft {
        MovementDraft::today()
    }

    fn validate(draft: &MovementDraft, ctx: &DraftContext<'_, Self>) -> Result<(), ValidationError> {
        let (_, product, quantity) = check_required(draft)?;
        check_stock(product, quantity, ctx.reference, ctx.original.map(|row| &row.0))
    }

    fn summary(draft: &MovementDraft, ctx: &DraftContext<'_, Self>) -> String {
        movement_summary("Release", draft, ctx.reference)
    }

    fn payload(draft: &MovementDraft, _mode: FormMode) -> Result<Value, serde_json::Error> {
        Ok(movement_payload(draft))
    }
}

/// Rows carrying a calendar date.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for StockIn {
    fn date(&self) -> NaiveDate {
        self.0.date
    }
}

impl Dated for StockOut {
    fn date(&self) -> NaiveDate {
        self.0.date
    }
}

impl<R: Resource + Dated> ResourceController<R> {
    /// Cached rows dated in calendar month `month` (1-12) of any year,
    /// in list order. Used for the monthly printout.
    pub fn rows_in_month(&self, month: u32) -> Vec<R> {
        self.items()
            .into_iter()
            .filter(|row| row.date().month() == month)
            .collect()
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;

use super::Category;
use crate::error::ValidationError;
use crate::resource::{DraftContext, FormMode, Resource};

/// Stock item. `weight` is the remaining quantity in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: i64,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub weight: Decimal,
    pub price_per_kg: Decimal,
    #[serde(default)]
    pub total_value: Option<Decimal>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Server value when present, otherwise weight times price.
    pub fn total_value(&self) -> Decimal {
        self.total_value.unwrap_or(self.weight * self.price_per_kg)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: Option<i64>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub weight: Option<Decimal>,
    pub price_per_kg: Option<Decimal>,
}

impl Resource for Product {
    type Draft = ProductDraft;
    type Reference = Category;

    const ENDPOINT: &'static str = "/products/";
    const REFERENCE_ENDPOINT: Option<&'static str> = Some(Category::ENDPOINT);
    const NOUN: &'static str = "product";

    fn id(&self) -> i64 {
        self.id
    }

    fn search_text(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(&self.name), Cow::Borrowed(&self.category_name)]
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.clone(),
            category: Some(self.category),
            color: self.color.clone().unwrap_or_default(),
            weight: Some(self.weight),
            price_per_kg: Some(self.price_per_kg),
        }
    }

    fn validate(draft: &ProductDraft, ctx: &DraftContext<'_, Self>) -> Result<(), ValidationError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::new("name", "product name is required"));
        }
        let Some(category) = draft.category else {
            return Err(ValidationError::new("category", "category is required"));
        };
        // Only checkable once the category list has arrived
        if !ctx.reference.is_empty() && !ctx.reference.iter().any(|c| c.id == category) {
            return Err(ValidationError::new("category", format!("unknown category {}", category)));
        }
        match draft.price_per_kg {
            None => return Err(ValidationError::new("price_per_kg", "price per kg is required")),
            Some(price) if price.is_sign_negative() => {
                return Err(ValidationError::new("price_per_kg", "price per kg cannot be negative"))
            }
            Some(_) => {}
        }
        if draft.weight.is_some_and(|w| w.is_sign_negative()) {
            return Err(ValidationError::new("weight", "weight cannot be negative"));
        }
        Ok(())
    }

    fn summary(draft: &ProductDraft, ctx: &DraftContext<'_, Self>) -> String {
        let category = draft
            .category
            .and_then(|id| ctx.reference.iter().find(|c| c.id == id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "-".to_string());
        let verb = if ctx.mode.is_edit() { "Update" } else { "Add" };
        format!(
            "{} product '{}' ({}, {} kg at {}/kg)?",
            verb,
            draft.name.trim(),
            category,
            draft.weight.unwrap_or_default(),
            draft.price_per_kg.unwrap_or_default(),
        )
    }

    fn payload(draft: &ProductDraft, _mode: FormMode) -> Result<Value, serde_json::Error> {
        Ok(json!({
            "name": draft.name.trim(),
            "category": draft.category,
            "color": draft.color,
            "weight": draft.weight.unwrap_or(Decimal::ZERO),
            "price_per_kg": draft.price_per_kg,
        }))
    }
}

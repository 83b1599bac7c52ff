use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::ValidationError;
use crate::resource::{DraftContext, FormMode, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
}

impl Resource for Category {
    type Draft = CategoryDraft;
    type Reference = ();

    const ENDPOINT: &'static str = "/categories/";
    const NOUN: &'static str = "category";

    fn id(&self) -> i64 {
        self.id
    }

    fn search_text(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(&self.name)]
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn to_draft(&self) -> CategoryDraft {
        CategoryDraft {
            name: self.name.clone(),
        }
    }

    fn validate(draft: &CategoryDraft, _ctx: &DraftContext<'_, Self>) -> Result<(), ValidationError> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::new("name", "category name is required"));
        }
        Ok(())
    }

    fn summary(draft: &CategoryDraft, ctx: &DraftContext<'_, Self>) -> String {
        match (ctx.mode, ctx.original) {
            (FormMode::Edit(_), Some(original)) => {
                format!("Rename category '{}' to '{}'?", original.name, draft.name.trim())
            }
            _ => format!("Add category '{}'?", draft.name.trim()),
        }
    }

    fn payload(draft: &CategoryDraft, _mode: FormMode) -> Result<serde_json::Value, serde_json::Error> {
        Ok(serde_json::json!({ "name": draft.name.trim() }))
    }
}

//! Generic list screen: fetch a collection, filter and paginate it locally,
//! and run create/update/delete through a confirm step.
//!
//! Each entity plugs in through [`Resource`]: its endpoint, which fields the
//! search box looks at, how a row becomes an edit draft, and which checks
//! run before a write is sent. Writes are never patched into the local copy;
//! every successful write is followed by a full reload.

mod controller;
mod form;
mod notice;
mod paginate;

pub use controller::ResourceController;
pub use form::{FormMode, FormState};
pub use notice::{Notice, NoticeKind};
pub use paginate::{clamp_page, matches_term, total_pages, visible_rows, ListView, Page};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

use crate::error::{ApiError, ValidationError};

/// What the pre-submit checks may look at besides the draft itself.
pub struct DraftContext<'a, R: Resource> {
    pub mode: FormMode,
    /// Auxiliary collection loaded alongside the main one
    pub reference: &'a [R::Reference],
    /// Row being edited, as last loaded
    pub original: Option<&'a R>,
}

pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Draft: Serialize + DeserializeOwned + Clone + Default + fmt::Debug + Send + Sync + 'static;
    type Reference: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Collection path, e.g. `/products/`
    const ENDPOINT: &'static str;
    /// Loaded in parallel with the collection, e.g. categories for products
    const REFERENCE_ENDPOINT: Option<&'static str> = None;
    /// Singular noun for messages
    const NOUN: &'static str;

    fn id(&self) -> i64;

    /// Fields the search box matches against.
    fn search_text(&self) -> Vec<Cow<'_, str>>;

    /// Human label used in confirmation prompts.
    fn label(&self) -> String;

    /// Pre-fill for the edit form.
    fn to_draft(&self) -> Self::Draft;

    fn empty_draft() -> Self::Draft {
        Self::Draft::default()
    }

    /// Client-side checks. Advisory only: the server still has the last word.
    fn validate(_draft: &Self::Draft, _ctx: &DraftContext<'_, Self>) -> Result<(), ValidationError> {
        Ok(())
    }

    /// One-line description of the pending write, shown before confirming.
    fn summary(draft: &Self::Draft, ctx: &DraftContext<'_, Self>) -> String;

    /// Request body for a draft.
    fn payload(draft: &Self::Draft, _mode: FormMode) -> Result<Value, serde_json::Error> {
        serde_json::to_value(draft)
    }

    fn item_path(id: i64) -> String {
        format!("{}{}/", Self::ENDPOINT, id)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("no {0} is waiting for confirmation")]
    NothingPending(&'static str),

    #[error("{noun} {id} is not in the loaded list")]
    UnknownRow { noun: &'static str, id: i64 },
}

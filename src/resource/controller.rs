use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use reqwest::Method;

use super::{DraftContext, FormMode, FormState, ListView, Notice, Page, Resource, ResourceError};
use crate::client::ApiClient;
use crate::config::AppConfig;
use crate::error::{ApiError, ValidationError};

struct ListState<R: Resource> {
    items: Vec<R>,
    reference: Vec<R::Reference>,
    loading: bool,
    view: ListView,
    form: FormState<R::Draft>,
    notice: Option<Notice>,
}

/// Owns one screen's copy of a collection.
///
/// Shared behind an `Arc` by whatever renders it. After [`detach`] no
/// response that arrives late will touch the state.
///
/// [`detach`]: ResourceController::detach
pub struct ResourceController<R: Resource> {
    client: ApiClient,
    state: RwLock<ListState<R>>,
    attached: AtomicBool,
    /// Bumped by every `load()`; only the latest one commits
    generation: AtomicU64,
    notice_lifetime: Duration,
}

impl<R: Resource> ResourceController<R> {
    pub fn new(client: ApiClient, config: &AppConfig) -> Self {
        Self::with_view(client, config, ListView::new(config.list.page_size))
    }

    pub fn with_view(client: ApiClient, config: &AppConfig, view: ListView) -> Self {
        Self {
            client,
            state: RwLock::new(ListState {
                items: Vec::new(),
                reference: Vec::new(),
                loading: false,
                view,
                form: FormState::Closed,
                notice: None,
            }),
            attached: AtomicBool::new(true),
            generation: AtomicU64::new(0),
            notice_lifetime: config.notice_lifetime(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ListState<R>> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ListState<R>> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// The screen went away; late responses are dropped from now on.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Fetch the collection and its reference data in parallel. Both must
    /// arrive before anything is committed; on failure the previous
    /// snapshot stays in place. When loads overlap, only the most recent
    /// one commits and clears the loading flag.
    pub async fn load(&self) -> Result<(), ApiError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.write().loading = true;

        let collection = self.client.get::<Vec<R>>(R::ENDPOINT);
        let reference = async {
            match R::REFERENCE_ENDPOINT {
                Some(path) => self.client.get::<Vec<R::Reference>>(path).await,
                None => Ok(Vec::new()),
            }
        };
        let (items, reference) = futures::join!(collection, reference);

        if !self.is_attached() {
            tracing::debug!("Dropping {} list response for a detached screen", R::NOUN);
            return Ok(());
        }

        let mut state = self.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Dropping superseded {} list response", R::NOUN);
            return Ok(());
        }
        state.loading = false;
        match (items, reference) {
            (Ok(items), Ok(reference)) => {
                tracing::debug!("Loaded {} {} row(s)", items.len(), R::NOUN);
                state.items = items;
                state.reference = reference;
                let total = self.page_of(&state).total_pages;
                state.view.clamp_to(total);
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Failed to load {} list: {}", R::NOUN, e);
                Err(e)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn items(&self) -> Vec<R> {
        self.read().items.clone()
    }

    pub fn reference(&self) -> Vec<R::Reference> {
        self.read().reference.clone()
    }

    pub fn find(&self, id: i64) -> Option<R> {
        self.read().items.iter().find(|item| item.id() == id).cloned()
    }

    pub fn view(&self) -> ListView {
        self.read().view.clone()
    }

    fn page_of(&self, state: &ListState<R>) -> Page<R> {
        super::visible_rows(
            &state.items,
            R::search_text,
            state.view.search(),
            state.view.page(),
            state.view.page_size(),
        )
    }

    /// Current page of the filtered collection. The stored page is clamped
    /// to the range that exists.
    pub fn visible(&self) -> Page<R> {
        let mut state = self.write();
        let page = self.page_of(&state);
        state.view.clamp_to(page.total_pages);
        page
    }

    pub fn set_search(&self, term: impl Into<String>) {
        self.write().view.set_search(term);
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.write().view.set_page_size(page_size);
    }

    pub fn set_page(&self, page: usize) {
        let mut state = self.write();
        state.view.set_page(page);
        let total = self.page_of(&state).total_pages;
        state.view.clamp_to(total);
    }

    pub fn next_page(&self) {
        let mut state = self.write();
        let total = self.page_of(&state).total_pages;
        state.view.next_page(total);
    }

    pub fn prev_page(&self) {
        self.write().view.prev_page();
    }

    /// Visible notice, dropping an expired success toast.
    pub fn notice(&self) -> Option<Notice> {
        let mut state = self.write();
        if state.notice.as_ref().is_some_and(|n| !n.is_visible()) {
            state.notice = None;
        }
        state.notice.clone()
    }

    pub fn acknowledge(&self) {
        self.write().notice = None;
    }

    pub fn form(&self) -> FormState<R::Draft> {
        self.read().form.clone()
    }

    pub fn open_create(&self) {
        self.write().form = FormState::Editing {
            mode: FormMode::Create,
            draft: R::empty_draft(),
        };
    }

    /// Open the edit form pre-filled from the loaded row.
    pub fn open_edit(&self, id: i64) -> Result<(), ResourceError> {
        let mut state = self.write();
        let row = state
            .items
            .iter()
            .find(|item| item.id() == id)
            .ok_or(ResourceError::UnknownRow { noun: R::NOUN, id })?;
        state.form = FormState::Editing {
            mode: FormMode::Edit(id),
            draft: row.to_draft(),
        };
        Ok(())
    }

    /// Replace the draft of the open form. Ignored when no form is editing.
    pub fn set_draft(&self, draft: R::Draft) {
        self.edit_draft(|current| *current = draft);
    }

    pub fn edit_draft(&self, f: impl FnOnce(&mut R::Draft)) {
        if let FormState::Editing { draft, .. } = &mut self.write().form {
            f(draft);
        }
    }

    /// Discard whatever form is open, without side effects.
    pub fn close(&self) {
        self.write().form = FormState::Closed;
    }

    fn context<'a>(state: &'a ListState<R>, mode: FormMode) -> DraftContext<'a, R> {
        let original = mode
            .id()
            .and_then(|id| state.items.iter().find(|item| item.id() == id));
        DraftContext {
            mode,
            reference: &state.reference,
            original,
        }
    }

    fn check(state: &ListState<R>, draft: &R::Draft, mode: FormMode) -> Result<(), ValidationError> {
        R::validate(draft, &Self::context(state, mode))
    }

    /// Run the pre-submit checks and move to the confirmation step.
    /// Returns the summary to show. On a failed check the form stays open
    /// and a blocking notice explains why.
    pub fn submit(&self) -> Result<String, ResourceError> {
        let mut state = self.write();
        let FormState::Editing { mode, draft } = state.form.clone() else {
            return Err(ResourceError::NothingPending(R::NOUN));
        };

        if let Err(e) = Self::check(&state, &draft, mode) {
            tracing::debug!("Rejected {} draft before sending: {}", R::NOUN, e);
            state.notice = Some(Notice::error(e.message.clone()));
            return Err(e.into());
        }

        let summary = R::summary(&draft, &Self::context(&state, mode));
        state.form = FormState::Confirming {
            mode,
            draft,
            summary: summary.clone(),
        };
        Ok(summary)
    }

    /// Back from the confirmation step to the form, draft intact.
    pub fn cancel_confirm(&self) {
        let mut state = self.write();
        if let FormState::Confirming { mode, draft, .. } = state.form.clone() {
            state.form = FormState::Editing { mode, draft };
        } else if matches!(state.form, FormState::ConfirmingDelete { .. }) {
            state.form = FormState::Closed;
        }
    }

    /// Send the confirmed create or update.
    /// The form moves to `Submitting` before the request goes out, so a
    /// repeated confirm finds nothing pending.
    pub async fn confirm(&self) -> Result<(), ResourceError> {
        let (mode, draft) = {
            let mut state = self.write();
            let FormState::Confirming { mode, draft, .. } = state.form.clone() else {
                return Err(ResourceError::NothingPending(R::NOUN));
            };
            state.form = FormState::Submitting {
                mode,
                draft: draft.clone(),
            };
            (mode, draft)
        };

        match mode {
            FormMode::Create => self.create(draft).await,
            FormMode::Edit(id) => self.update(id, draft).await,
        }
    }

    pub async fn create(&self, draft: R::Draft) -> Result<(), ResourceError> {
        self.save(FormMode::Create, draft).await
    }

    pub async fn update(&self, id: i64, draft: R::Draft) -> Result<(), ResourceError> {
        self.save(FormMode::Edit(id), draft).await
    }

    async fn save(&self, mode: FormMode, draft: R::Draft) -> Result<(), ResourceError> {
        {
            let mut state = self.write();
            if let Err(e) = Self::check(&state, &draft, mode) {
                state.notice = Some(Notice::error(e.message.clone()));
                state.form = FormState::Editing { mode, draft };
                return Err(e.into());
            }
            state.form = FormState::Submitting {
                mode,
                draft: draft.clone(),
            };
        }

        let result = match R::payload(&draft, mode) {
            Ok(body) => {
                let (method, path) = match mode {
                    FormMode::Create => (Method::POST, R::ENDPOINT.to_string()),
                    FormMode::Edit(id) => (Method::PUT, R::item_path(id)),
                };
                self.client.request(method, &path, Some(&body)).await
            }
            Err(e) => Err(ApiError::invalid_json(e.to_string())),
        };

        if !self.is_attached() {
            tracing::debug!("Dropping {} save result for a detached screen", R::NOUN);
            return result.map(|_| ()).map_err(ResourceError::from);
        }

        match result {
            Ok(_) => {
                self.write().form = FormState::Closed;
                let verb = if mode.is_edit() { "updated" } else { "created" };
                tracing::info!("{} {}", R::NOUN, verb);
                // A failed reload is logged inside load(); the write itself stood.
                let _ = self.load().await;
                self.write().view.reset_page();
                self.notify(Notice::success(capitalized(R::NOUN, verb), self.notice_lifetime));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", R::NOUN, e);
                let mut state = self.write();
                state.notice = Some(Notice::error(format!("Failed to save {}: {}", R::NOUN, e.message())));
                // Reopen with the rejected draft so no input is lost
                state.form = FormState::Editing { mode, draft };
                Err(e.into())
            }
        }
    }

    /// Ask for confirmation before deleting. Returns the prompt.
    pub fn request_delete(&self, id: i64) -> Result<String, ResourceError> {
        let mut state = self.write();
        let row = state
            .items
            .iter()
            .find(|item| item.id() == id)
            .ok_or(ResourceError::UnknownRow { noun: R::NOUN, id })?;
        let summary = format!("Delete {} '{}'?", R::NOUN, row.label());
        state.form = FormState::ConfirmingDelete {
            id,
            summary: summary.clone(),
        };
        Ok(summary)
    }

    pub async fn confirm_delete(&self) -> Result<(), ResourceError> {
        let id = {
            let mut state = self.write();
            let FormState::ConfirmingDelete { id, .. } = state.form else {
                return Err(ResourceError::NothingPending(R::NOUN));
            };
            state.form = FormState::Closed;
            id
        };
        self.delete(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ResourceError> {
        let result = self.client.delete(&R::item_path(id)).await;

        if !self.is_attached() {
            tracing::debug!("Dropping {} delete result for a detached screen", R::NOUN);
            return result.map_err(ResourceError::from);
        }

        self.write().form = FormState::Closed;
        match result {
            Ok(()) => {
                tracing::info!("{} {} deleted", R::NOUN, id);
                let _ = self.load().await;
                self.write().view.reset_page();
                self.notify(Notice::success(capitalized(R::NOUN, "deleted"), self.notice_lifetime));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to delete {} {}: {}", R::NOUN, id, e);
                self.notify(Notice::error(format!("Failed to delete {}: {}", R::NOUN, e.message())));
                Err(e.into())
            }
        }
    }

    fn notify(&self, notice: Notice) {
        if self.is_attached() {
            self.write().notice = Some(notice);
        }
    }
}

fn capitalized(noun: &str, verb: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => format!("{}{} {}", first.to_uppercase(), chars.as_str(), verb),
        None => verb.to_string(),
    }
}

impl<R: Resource> std::fmt::Debug for ResourceController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("ResourceController")
            .field("resource", &R::NOUN)
            .field("items", &state.items.len())
            .field("loading", &state.loading)
            .field("view", &state.view)
            .finish()
    }
}

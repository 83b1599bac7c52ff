#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

impl FormMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, FormMode::Edit(_))
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(*id),
        }
    }
}

/// Modal flow of one list screen.
///
/// ```text
/// Closed -> Editing -> Confirming -> Submitting -> Closed
///              ^           |             \-> failure -> Editing (draft kept)
///              \-- cancel -/
/// Closed -> ConfirmingDelete -> Closed (request sent)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FormState<D> {
    Closed,
    Editing { mode: FormMode, draft: D },
    Confirming { mode: FormMode, draft: D, summary: String },
    /// Request in flight; nothing can be confirmed again until it settles
    Submitting { mode: FormMode, draft: D },
    ConfirmingDelete { id: i64, summary: String },
}

impl<D> FormState<D> {
    pub fn is_open(&self) -> bool {
        !matches!(self, FormState::Closed)
    }

    pub fn draft(&self) -> Option<&D> {
        match self {
            FormState::Editing { draft, .. }
            | FormState::Confirming { draft, .. }
            | FormState::Submitting { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<FormMode> {
        match self {
            FormState::Editing { mode, .. }
            | FormState::Confirming { mode, .. }
            | FormState::Submitting { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            FormState::Confirming { summary, .. } | FormState::ConfirmingDelete { summary, .. } => {
                Some(summary)
            }
            _ => None,
        }
    }
}

impl<D> Default for FormState<D> {
    fn default() -> Self {
        FormState::Closed
    }
}

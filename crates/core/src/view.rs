use crate::types::Movie;

/// What the results section shows. Exactly one state is active, so a
/// loading indicator and an error message can never coexist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewState {
    /// Before the first search has started.
    #[default]
    Idle,
    Loading,
    Error(String),
    Loaded(Vec<Movie>),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ViewState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn movies(&self) -> &[Movie] {
        match self {
            ViewState::Loaded(movies) => movies,
            _ => &[],
        }
    }
}

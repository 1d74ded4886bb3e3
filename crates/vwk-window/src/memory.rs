use crate::sink::{ChatLog, PresentationError, Presenter, VisibilitySink};

/// Presenter with no rendering surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render(&mut self, _indices: &[usize], _hidden: bool) -> Result<(), PresentationError> {
        Ok(())
    }
}

/// In-memory log of visibility flags.
///
/// Each entry is `Some(hidden)` or `None` for a missing entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryLog<P = NullPresenter> {
    entries: Vec<Option<bool>>,
    presenter: P,
    persist_requests: usize,
}

impl MemoryLog<NullPresenter> {
    /// `len` visible entries.
    pub fn visible(len: usize) -> Self {
        Self::from_flags(vec![false; len])
    }

    pub fn from_flags(flags: Vec<bool>) -> Self {
        Self::from_entries(flags.into_iter().map(Some).collect())
    }

    pub fn from_entries(entries: Vec<Option<bool>>) -> Self {
        Self::with_presenter(entries, NullPresenter)
    }
}

impl<P: Presenter> MemoryLog<P> {
    pub fn with_presenter(entries: Vec<Option<bool>>, presenter: P) -> Self {
        Self {
            entries,
            presenter,
            persist_requests: 0,
        }
    }

    /// Append `count` visible entries.
    pub fn append_visible(&mut self, count: usize) {
        self.entries.extend(std::iter::repeat(Some(false)).take(count));
    }

    /// Remove the entry at `index`, shifting later entries down.
    pub fn remove(&mut self, index: usize) -> Option<Option<bool>> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn entries(&self) -> &[Option<bool>] {
        &self.entries
    }

    /// Indices currently hidden, ascending.
    pub fn hidden_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| (*e == Some(true)).then_some(i))
            .collect()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Number of persistence requests received so far.
    pub fn persist_requests(&self) -> usize {
        self.persist_requests
    }
}

impl<P> ChatLog for MemoryLog<P> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn hidden_at(&self, index: usize) -> Option<bool> {
        self.entries.get(index).copied().flatten()
    }
}

impl<P: Presenter> VisibilitySink for MemoryLog<P> {
    fn set_hidden(&mut self, index: usize, hidden: bool) {
        if let Some(Some(flag)) = self.entries.get_mut(index) {
            *flag = hidden;
        }
    }

    fn present(&mut self, indices: &[usize], hidden: bool) -> Result<(), PresentationError> {
        self.presenter.render(indices, hidden)
    }

    fn persist(&mut self) {
        self.persist_requests += 1;
    }
}

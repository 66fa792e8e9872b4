//! Pagination state of a refresh run.

/// Where a refresh target is in its run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunStatus {
    /// No page has been fetched yet.
    #[default]
    NotStarted,
    /// Pages remain; `page` is the index of the next one to fetch.
    InProgress {
        /// Index of the next page, at least 1.
        page: usize,
    },
    /// The last run covered every local record.
    Complete,
}

impl RunStatus {
    /// Returns true if a `continue_fetch` would fetch a page.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, RunStatus::InProgress { .. })
    }

    /// Returns the index of the page the next fetch reads.
    ///
    /// A run that is not in progress starts over at page 0.
    pub fn page_index(&self) -> usize {
        match self {
            RunStatus::InProgress { page } => *page,
            RunStatus::NotStarted | RunStatus::Complete => 0,
        }
    }
}

/// Mutable run state of one refresh target.
///
/// Owned by a single target and mutated only after a page fetch
/// succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    status: RunStatus,
    total_count: usize,
}

impl PaginationState {
    /// Creates a state for a run that has not started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the run status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns the local record count captured when the run began.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Forgets any run in progress.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Records a successful fetch of page `page` that returned `fetched`
    /// records, against a run total of `total_count`.
    pub(crate) fn advance(
        &mut self,
        page: usize,
        total_count: usize,
        batch_size: usize,
        fetched: usize,
    ) {
        let records_so_far = batch_size.saturating_mul(page).saturating_add(fetched);
        self.total_count = total_count;
        self.status = if records_so_far < total_count {
            RunStatus::InProgress { page: page + 1 }
        } else {
            RunStatus::Complete
        };
    }
}

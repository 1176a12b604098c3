use chrono::{NaiveDate, Utc};
use showcal_core::common::error::{DiscoveryError, Result};
use showcal_core::domain::{EventStub, ScrapedEvent};
use std::collections::{HashMap, HashSet};

/// Where the operator is in the curation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationStep {
    ChooseVenues,
    PreviewAndSelect,
    Import,
}

/// Single source of truth for one curation session: venues chosen, preview
/// caches, per-venue selection sets, and the global accumulation list of
/// scraped events.
///
/// Transitions are plain methods over `&mut self`; callers sharing this
/// across tasks must serialize access (the server wraps it in a mutex).
/// Step navigation is guarded by current state, re-evaluated per attempt.
#[derive(Debug)]
pub struct SelectionState {
    step: CurationStep,
    chosen: Vec<String>,
    previews: HashMap<String, Vec<EventStub>>,
    selected: HashMap<String, HashSet<String>>,
    accumulated: Vec<ScrapedEvent>,
    seen_ids: HashSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            step: CurationStep::ChooseVenues,
            chosen: Vec::new(),
            previews: HashMap::new(),
            selected: HashMap::new(),
            accumulated: Vec::new(),
            seen_ids: HashSet::new(),
        }
    }

    pub fn step(&self) -> CurationStep {
        self.step
    }

    pub fn chosen_venues(&self) -> &[String] {
        &self.chosen
    }

    pub fn preview_for(&self, slug: &str) -> Option<&[EventStub]> {
        self.previews.get(slug).map(Vec::as_slice)
    }

    pub fn selected_ids(&self, slug: &str) -> HashSet<String> {
        self.selected.get(slug).cloned().unwrap_or_default()
    }

    pub fn accumulated(&self) -> &[ScrapedEvent] {
        &self.accumulated
    }

    /// Replace the venue selection. Starting a new pass invalidates every
    /// prior preview, selection, and accumulated event.
    pub fn choose_venues(&mut self, slugs: Vec<String>) {
        self.chosen = slugs;
        self.previews.clear();
        self.selected.clear();
        self.accumulated.clear();
        self.seen_ids.clear();
    }

    /// Store a venue's preview list. The venue's selection set resets to
    /// empty; the operator opts in to each event explicitly.
    pub fn record_preview(&mut self, slug: &str, stubs: Vec<EventStub>) {
        self.previews.insert(slug.to_string(), stubs);
        self.selected.insert(slug.to_string(), HashSet::new());
    }

    /// Toggle one event in a venue's selection set. Ids not present in the
    /// venue's preview list are ignored. Returns whether the id is selected
    /// after the call.
    pub fn toggle_event(&mut self, slug: &str, event_id: &str) -> bool {
        let known = self
            .previews
            .get(slug)
            .map(|stubs| stubs.iter().any(|s| s.id == event_id))
            .unwrap_or(false);
        if !known {
            return false;
        }
        let set = self.selected.entry(slug.to_string()).or_default();
        if set.contains(event_id) {
            set.remove(event_id);
            false
        } else {
            set.insert(event_id.to_string());
            true
        }
    }

    /// Select every previewed event dated today or later. Past events stay
    /// unselected (they remain toggle-able by hand).
    pub fn select_all(&mut self, slug: &str) {
        self.select_all_as_of(slug, Utc::now().date_naive());
    }

    pub fn select_all_as_of(&mut self, slug: &str, today: NaiveDate) {
        let upcoming: HashSet<String> = match self.previews.get(slug) {
            Some(stubs) => stubs
                .iter()
                .filter(|s| s.date >= today)
                .map(|s| s.id.clone())
                .collect(),
            None => return,
        };
        self.selected.insert(slug.to_string(), upcoming);
    }

    pub fn select_none(&mut self, slug: &str) {
        if let Some(set) = self.selected.get_mut(slug) {
            set.clear();
        }
    }

    /// Append scraped events whose id has not been accumulated yet. The
    /// accumulation list grows monotonically for the life of the session;
    /// a later scrape of an already-seen id is dropped, not merged.
    /// Returns how many events were actually added.
    pub fn accumulate_scraped(&mut self, events: Vec<ScrapedEvent>) -> usize {
        let mut added = 0;
        for event in events {
            if self.seen_ids.insert(event.id.clone()) {
                self.accumulated.push(event);
                added += 1;
            }
        }
        added
    }

    /// Whether navigation to `step` is currently allowed. Pure guard over
    /// current state; nothing is persisted.
    pub fn can_enter(&self, step: CurationStep) -> bool {
        match step {
            CurationStep::ChooseVenues => true,
            CurationStep::PreviewAndSelect => !self.chosen.is_empty(),
            CurationStep::Import => !self.accumulated.is_empty(),
        }
    }

    pub fn try_enter(&mut self, step: CurationStep) -> Result<()> {
        if !self.can_enter(step) {
            let reason = match step {
                CurationStep::ChooseVenues => unreachable!("always reachable"),
                CurationStep::PreviewAndSelect => "no venues chosen",
                CurationStep::Import => "no events scraped",
            };
            return Err(DiscoveryError::StepBlocked(reason.to_string()));
        }
        self.step = step;
        Ok(())
    }

    /// Back to the initial step with all state cleared.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

//! Quick-Add wizard state machine.
//!
//! The wizard performs no I/O. Every network round-trip is split into a
//! `begin_*` call that records intent and hands back a ticket, and a
//! `finish_*` call that applies the response. Tickets carry the request
//! generation (image search) or confirmation epoch (directory loads,
//! submit) current when they were issued; a response whose ticket no longer
//! matches is discarded, so the last request issued wins regardless of the
//! order responses arrive in.

use std::collections::HashSet;
use std::fmt;

use partsbin_client::ClientError;
use partsbin_core::{ImageSuggestion, Location, SearchCandidate, SpecDefinition};

use crate::commit::{CommitRequest, CommitResult};
use crate::error::{FieldError, QuickAddError};
use crate::form::{ConfirmForm, FormField};

/// Most images a single part can be created with.
pub const MAX_ATTACHED_IMAGES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Searching,
    Selecting,
    Confirming,
}

impl Step {
    /// 1-based position shown in the step indicator.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Step::Searching => 1,
            Step::Selecting => 2,
            Step::Confirming => 3,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Searching => write!(f, "search"),
            Step::Selecting => write!(f, "select"),
            Step::Confirming => write!(f, "confirm"),
        }
    }
}

/// An issued image search. Pass back to [`QuickAddWizard::finish_image_search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSearchTicket {
    pub generation: u64,
    pub query: String,
}

/// An issued pair of directory loads for one confirmation epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryTicket {
    pub epoch: u64,
}

/// Background work to start after entering the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmEntry {
    pub directory: DirectoryTicket,
    pub images: ImageSearchTicket,
}

/// A validated form handed to the commit pipeline.
#[derive(Debug, Clone)]
pub struct SubmitTicket {
    epoch: u64,
    request: CommitRequest,
}

impl SubmitTicket {
    #[must_use]
    pub fn request(&self) -> &CommitRequest {
        &self.request
    }

    /// Location the part is being stocked at.
    #[must_use]
    pub fn location_id(&self) -> i64 {
        self.request.location_id()
    }
}

#[derive(Debug, Clone, Default)]
struct ImagePicker {
    query: String,
    generation: u64,
    loading: bool,
    suggestions: Vec<ImageSuggestion>,
    selected: Vec<String>,
    failed: HashSet<String>,
}

impl ImagePicker {
    fn is_visible(&self, url: &str) -> bool {
        !self.failed.contains(url) && self.suggestions.iter().any(|s| s.url == url)
    }
}

/// Working state of step 3. Dropped as a whole when the user leaves it.
#[derive(Debug, Clone)]
pub struct ConfirmState {
    candidate: SearchCandidate,
    form: ConfirmForm,
    epoch: u64,
    remembered_location: Option<i64>,
    locations: Vec<Location>,
    spec_definitions: Vec<SpecDefinition>,
    directories_loading: bool,
    directory_error: Option<String>,
    images: ImagePicker,
    field_errors: Vec<FieldError>,
    saving: bool,
    submit_error: Option<String>,
    committed: Option<CommitResult>,
}

impl ConfirmState {
    #[must_use]
    pub fn candidate(&self) -> &SearchCandidate {
        &self.candidate
    }

    #[must_use]
    pub fn form(&self) -> &ConfirmForm {
        &self.form
    }

    #[must_use]
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    #[must_use]
    pub fn spec_definitions(&self) -> &[SpecDefinition] {
        &self.spec_definitions
    }

    #[must_use]
    pub fn directory_error(&self) -> Option<&str> {
        self.directory_error.as_deref()
    }

    /// Query of the most recently issued image search.
    #[must_use]
    pub fn image_query(&self) -> &str {
        &self.images.query
    }

    /// Selected image URLs in the order they were picked.
    #[must_use]
    pub fn selected_images(&self) -> &[String] {
        &self.images.selected
    }

    #[must_use]
    pub fn is_selected(&self, url: &str) -> bool {
        self.images.selected.iter().any(|u| u == url)
    }

    #[must_use]
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    #[must_use]
    pub fn committed(&self) -> Option<&CommitResult> {
        self.committed.as_ref()
    }
}

#[derive(Debug, Clone)]
pub struct QuickAddWizard {
    step: Step,
    query: String,
    searching: bool,
    search_error: Option<String>,
    candidates: Vec<SearchCandidate>,
    confirm: Option<ConfirmState>,
    last_epoch: u64,
    last_generation: u64,
}

impl Default for QuickAddWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl QuickAddWizard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: Step::Searching,
            query: String::new(),
            searching: false,
            search_error: None,
            candidates: Vec::new(),
            confirm: None,
            last_epoch: 0,
            last_generation: 0,
        }
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Search text as last submitted; kept across failures and new searches.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn is_searching(&self) -> bool {
        self.searching
    }

    #[must_use]
    pub fn search_error(&self) -> Option<&str> {
        self.search_error.as_deref()
    }

    #[must_use]
    pub fn candidates(&self) -> &[SearchCandidate] {
        &self.candidates
    }

    #[must_use]
    pub fn confirm(&self) -> Option<&ConfirmState> {
        self.confirm.as_ref()
    }

    #[must_use]
    pub fn images_loading(&self) -> bool {
        self.confirm.as_ref().is_some_and(|c| c.images.loading)
    }

    #[must_use]
    pub fn directories_loading(&self) -> bool {
        self.confirm.as_ref().is_some_and(|c| c.directories_loading)
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.confirm.as_ref().is_some_and(|c| c.saving)
    }

    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        self.confirm
            .as_ref()
            .map_or(&[][..], |c| c.field_errors.as_slice())
    }

    /// Current suggestions minus any the shell reported as unrenderable.
    #[must_use]
    pub fn visible_suggestions(&self) -> Vec<&ImageSuggestion> {
        let Some(confirm) = &self.confirm else {
            return Vec::new();
        };
        confirm
            .images
            .suggestions
            .iter()
            .filter(|s| !confirm.images.failed.contains(&s.url))
            .collect()
    }

    // ── Step 1: search ──────────────────────────────────────────────────

    /// Records a part search and returns the trimmed query to send.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::WrongStep`] outside the search step,
    /// [`QuickAddError::SearchInProgress`] while a search is outstanding,
    /// [`QuickAddError::EmptyQuery`] for blank input.
    pub fn begin_search(&mut self, query: &str) -> Result<String, QuickAddError> {
        self.expect_step(Step::Searching)?;
        if self.searching {
            return Err(QuickAddError::SearchInProgress);
        }
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(QuickAddError::EmptyQuery);
        }
        query.clone_into(&mut self.query);
        self.searching = true;
        self.search_error = None;
        Ok(trimmed.to_string())
    }

    /// Applies the part search response. Success advances to the selection
    /// step even when no candidates came back.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::SearchFailed`] with the normalized message; the
    /// wizard stays on the search step with the query intact.
    pub fn finish_search(
        &mut self,
        result: Result<Vec<SearchCandidate>, ClientError>,
    ) -> Result<(), QuickAddError> {
        if !self.searching || self.step != Step::Searching {
            tracing::debug!("discarding part search response with no outstanding search");
            return Ok(());
        }
        self.searching = false;
        match result {
            Ok(candidates) => {
                tracing::info!(query = %self.query.trim(), count = candidates.len(), "part search complete");
                self.candidates = candidates;
                self.step = Step::Selecting;
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(query = %self.query.trim(), error = %message, "part search failed");
                self.search_error = Some(message.clone());
                Err(QuickAddError::SearchFailed(message))
            }
        }
    }

    /// Selecting → Searching. Discards the result list; the query text stays.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::WrongStep`] outside the selection step.
    pub fn new_search(&mut self) -> Result<(), QuickAddError> {
        self.expect_step(Step::Selecting)?;
        self.candidates.clear();
        self.step = Step::Searching;
        Ok(())
    }

    // ── Step 2: select ──────────────────────────────────────────────────

    /// Enters the confirmation step for candidate `index`.
    ///
    /// Builds a fresh form from the candidate, clears the image selection and
    /// failure markers, and returns the directory loads and image search the
    /// caller must start. `remembered_location` is applied once the location
    /// directory confirms it still exists. Selecting from the confirmation
    /// step replaces the current form as if the user had gone back first.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::WrongStep`] on the search step,
    /// [`QuickAddError::SubmitInProgress`] while saving,
    /// [`QuickAddError::NoSuchCandidate`] for an out-of-range index.
    pub fn select_candidate(
        &mut self,
        index: usize,
        remembered_location: Option<i64>,
    ) -> Result<ConfirmEntry, QuickAddError> {
        if self.step == Step::Searching {
            return Err(QuickAddError::WrongStep {
                expected: Step::Selecting,
                actual: self.step,
            });
        }
        if self.is_saving() {
            return Err(QuickAddError::SubmitInProgress);
        }
        let candidate = self
            .candidates
            .get(index)
            .cloned()
            .ok_or(QuickAddError::NoSuchCandidate(index))?;

        self.last_epoch += 1;
        self.last_generation += 1;
        let epoch = self.last_epoch;
        let generation = self.last_generation;
        let seed = candidate.mpn.clone();

        tracing::info!(mpn = %candidate.mpn, epoch, "entering confirmation");
        self.confirm = Some(ConfirmState {
            form: ConfirmForm::from_candidate(&candidate),
            candidate,
            epoch,
            remembered_location,
            locations: Vec::new(),
            spec_definitions: Vec::new(),
            directories_loading: true,
            directory_error: None,
            images: ImagePicker {
                query: seed.clone(),
                generation,
                loading: true,
                ..ImagePicker::default()
            },
            field_errors: Vec::new(),
            saving: false,
            submit_error: None,
            committed: None,
        });
        self.step = Step::Confirming;

        Ok(ConfirmEntry {
            directory: DirectoryTicket { epoch },
            images: ImageSearchTicket {
                generation,
                query: seed,
            },
        })
    }

    // ── Step 3: confirm ─────────────────────────────────────────────────

    /// Applies both directory loads for the epoch in `ticket`. A failed load
    /// leaves its list empty and records a message. Returns `false` if the
    /// ticket is stale and nothing was applied.
    pub fn finish_directory_load(
        &mut self,
        ticket: DirectoryTicket,
        locations: Result<Vec<Location>, ClientError>,
        spec_definitions: Result<Vec<SpecDefinition>, ClientError>,
    ) -> bool {
        let Some(confirm) = self.current_confirm_mut(ticket.epoch) else {
            tracing::debug!(epoch = ticket.epoch, "discarding stale directory load");
            return false;
        };

        let mut errors = Vec::new();
        confirm.locations = locations.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load locations");
            errors.push(format!("locations: {e}"));
            Vec::new()
        });
        confirm.spec_definitions = spec_definitions.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load specification fields");
            errors.push(format!("specification fields: {e}"));
            Vec::new()
        });
        confirm.directory_error = (!errors.is_empty()).then(|| errors.join("; "));
        confirm.directories_loading = false;

        confirm.form.prefill_specs(&confirm.spec_definitions);

        if confirm.form.location_id.trim().is_empty() {
            if let Some(id) = confirm.remembered_location {
                if confirm.locations.iter().any(|l| l.id == id) {
                    confirm.form.location_id = id.to_string();
                } else {
                    tracing::debug!(location_id = id, "remembered location no longer exists");
                }
            }
        }
        true
    }

    /// Issues a new image search with a user-edited query. Any search still
    /// in flight becomes stale. The current selection is kept.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::WrongStep`] outside the confirmation step,
    /// [`QuickAddError::EmptyQuery`] for blank input.
    pub fn begin_image_search(&mut self, query: &str) -> Result<ImageSearchTicket, QuickAddError> {
        self.expect_step(Step::Confirming)?;
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(QuickAddError::EmptyQuery);
        }
        self.last_generation += 1;
        let generation = self.last_generation;
        let confirm = self.confirm_mut()?;
        confirm.images.query = trimmed.to_string();
        confirm.images.generation = generation;
        confirm.images.loading = true;
        confirm.images.suggestions.clear();
        confirm.images.failed.clear();
        Ok(ImageSearchTicket {
            generation,
            query: trimmed.to_string(),
        })
    }

    /// Applies an image search response if `ticket` is still the latest one
    /// issued. A failed search yields zero suggestions. Returns whether the
    /// response was applied.
    pub fn finish_image_search(
        &mut self,
        ticket: &ImageSearchTicket,
        result: Result<Vec<ImageSuggestion>, ClientError>,
    ) -> bool {
        let Some(confirm) = self
            .confirm
            .as_mut()
            .filter(|c| c.images.generation == ticket.generation)
        else {
            tracing::debug!(
                generation = ticket.generation,
                query = %ticket.query,
                "discarding stale image suggestions"
            );
            return false;
        };

        confirm.images.loading = false;
        confirm.images.suggestions = result.unwrap_or_else(|e| {
            tracing::warn!(query = %ticket.query, error = %e, "image search failed");
            Vec::new()
        });
        true
    }

    /// Flips selection of the suggestion with canonical `url` and returns
    /// whether it is now selected.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::UnknownImage`] if `url` is not a visible suggestion,
    /// [`QuickAddError::ImageLimitReached`] when adding past the cap.
    pub fn toggle_image(&mut self, url: &str) -> Result<bool, QuickAddError> {
        self.expect_step(Step::Confirming)?;
        let images = &mut self.confirm_mut()?.images;
        if let Some(pos) = images.selected.iter().position(|u| u == url) {
            images.selected.remove(pos);
            return Ok(false);
        }
        if !images.is_visible(url) {
            return Err(QuickAddError::UnknownImage(url.to_string()));
        }
        if images.selected.len() >= MAX_ATTACHED_IMAGES {
            return Err(QuickAddError::ImageLimitReached {
                max: MAX_ATTACHED_IMAGES,
            });
        }
        images.selected.push(url.to_string());
        Ok(true)
    }

    /// Hides a suggestion the shell could not render and drops it from the
    /// selection. Markers last until the next image search or candidate.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::WrongStep`] outside the confirmation step.
    pub fn mark_image_failed(&mut self, url: &str) -> Result<(), QuickAddError> {
        self.expect_step(Step::Confirming)?;
        let images = &mut self.confirm_mut()?.images;
        images.failed.insert(url.to_string());
        images.selected.retain(|u| u != url);
        Ok(())
    }

    /// # Errors
    ///
    /// [`QuickAddError::WrongStep`] outside the confirmation step.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) -> Result<(), QuickAddError> {
        self.expect_step(Step::Confirming)?;
        let confirm = self.confirm_mut()?;
        confirm.form.set(field, value);
        confirm.field_errors.clear();
        Ok(())
    }

    /// # Errors
    ///
    /// [`QuickAddError::NotReady`] before specification fields have loaded,
    /// [`QuickAddError::UnknownSpecField`] for a name with no definition.
    pub fn set_spec_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), QuickAddError> {
        self.expect_step(Step::Confirming)?;
        let confirm = self.confirm_mut()?;
        if confirm.directories_loading {
            return Err(QuickAddError::NotReady);
        }
        if !confirm.form.set_spec_value(name, value.into()) {
            return Err(QuickAddError::UnknownSpecField(name.to_string()));
        }
        confirm.field_errors.clear();
        Ok(())
    }

    /// Confirming → Selecting. Drops the form, the selection and any pending
    /// image or directory response; the candidate list is kept.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::WrongStep`] outside the confirmation step,
    /// [`QuickAddError::SubmitInProgress`] while saving.
    pub fn back_to_results(&mut self) -> Result<(), QuickAddError> {
        self.expect_step(Step::Confirming)?;
        if self.is_saving() {
            return Err(QuickAddError::SubmitInProgress);
        }
        self.confirm = None;
        self.step = Step::Selecting;
        Ok(())
    }

    /// Validates the form and, if it passes, marks the wizard as saving and
    /// returns the commit request to run.
    ///
    /// # Errors
    ///
    /// [`QuickAddError::ValidationFailed`] with every field-level problem
    /// (also kept in [`QuickAddWizard::field_errors`]),
    /// [`QuickAddError::NotReady`] while directories are loading,
    /// [`QuickAddError::SubmitInProgress`] while a submit is outstanding,
    /// [`QuickAddError::AlreadyCommitted`] once this form created a part.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, QuickAddError> {
        self.expect_step(Step::Confirming)?;
        let confirm = self.confirm_mut()?;
        if confirm.saving {
            return Err(QuickAddError::SubmitInProgress);
        }
        if let Some(done) = &confirm.committed {
            return Err(QuickAddError::AlreadyCommitted {
                part_id: done.created_part_id,
            });
        }
        if confirm.directories_loading {
            return Err(QuickAddError::NotReady);
        }

        match confirm.form.validate() {
            Ok(valid) => {
                confirm.field_errors.clear();
                confirm.submit_error = None;
                confirm.saving = true;
                Ok(SubmitTicket {
                    epoch: confirm.epoch,
                    request: CommitRequest::new(
                        valid,
                        confirm.images.selected.clone(),
                        confirm.form.spec_values(),
                    ),
                })
            }
            Err(errors) => {
                confirm.field_errors.clone_from(&errors);
                Err(QuickAddError::ValidationFailed(errors))
            }
        }
    }

    /// Records the commit outcome and passes it through. A failed create
    /// keeps the form for correction with the message in
    /// [`ConfirmState::submit_error`].
    ///
    /// # Errors
    ///
    /// Returns the pipeline's error unchanged.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<CommitResult, QuickAddError>,
    ) -> Result<CommitResult, QuickAddError> {
        let Some(confirm) = self.current_confirm_mut(ticket.epoch) else {
            return result;
        };
        confirm.saving = false;
        match &result {
            Ok(done) => confirm.committed = Some(done.clone()),
            Err(e) => confirm.submit_error = Some(e.to_string()),
        }
        result
    }

    /// Back to an empty search step, dropping everything.
    pub fn restart(&mut self) {
        let last_epoch = self.last_epoch;
        let last_generation = self.last_generation;
        *self = Self {
            last_epoch,
            last_generation,
            ..Self::new()
        };
    }

    fn expect_step(&self, expected: Step) -> Result<(), QuickAddError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(QuickAddError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    fn confirm_mut(&mut self) -> Result<&mut ConfirmState, QuickAddError> {
        let actual = self.step;
        self.confirm.as_mut().ok_or(QuickAddError::WrongStep {
            expected: Step::Confirming,
            actual,
        })
    }

    fn current_confirm_mut(&mut self, epoch: u64) -> Option<&mut ConfirmState> {
        if self.step != Step::Confirming {
            return None;
        }
        self.confirm.as_mut().filter(|c| c.epoch == epoch)
    }
}

#[cfg(test)]
#[path = "wizard_test.rs"]
mod tests;

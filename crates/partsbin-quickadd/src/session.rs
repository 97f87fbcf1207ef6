//! Async driver that runs a [`QuickAddWizard`] against live collaborators.
//!
//! Image searches run as spawned tasks and report back over a channel, so
//! the caller keeps editing the form while suggestions load. Responses are
//! applied when the caller pumps the channel; the wizard's generation check
//! drops any that were superseded in the meantime.

use std::sync::Arc;

use partsbin_client::ClientError;
use partsbin_core::ImageSuggestion;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::commit::{self, CommitResult};
use crate::error::QuickAddError;
use crate::gateway::{DirectoryLoader, InventoryWriter, SearchGateway};
use crate::prefs::{remembered_location, PreferenceStore, LAST_LOCATION_KEY};
use crate::wizard::{ImageSearchTicket, QuickAddWizard};

/// Everything a session needs from the inventory API.
pub trait QuickAddApi: SearchGateway + DirectoryLoader + InventoryWriter + 'static {}

impl<T> QuickAddApi for T where T: SearchGateway + DirectoryLoader + InventoryWriter + 'static {}

struct ImageDelivery {
    ticket: ImageSearchTicket,
    result: Result<Vec<ImageSuggestion>, ClientError>,
}

pub struct QuickAddSession<A, P> {
    api: Arc<A>,
    prefs: P,
    wizard: QuickAddWizard,
    image_tx: mpsc::UnboundedSender<ImageDelivery>,
    image_rx: mpsc::UnboundedReceiver<ImageDelivery>,
    /// The most recently spawned image search; earlier ones can only be stale.
    image_task: Option<(ImageSearchTicket, JoinHandle<()>)>,
}

impl<A: QuickAddApi, P: PreferenceStore> QuickAddSession<A, P> {
    pub fn new(api: Arc<A>, prefs: P) -> Self {
        let (image_tx, image_rx) = mpsc::unbounded_channel();
        Self {
            api,
            prefs,
            wizard: QuickAddWizard::new(),
            image_tx,
            image_rx,
            image_task: None,
        }
    }

    pub fn wizard(&self) -> &QuickAddWizard {
        &self.wizard
    }

    /// Direct access for synchronous edits: form fields, image toggles,
    /// navigation.
    pub fn wizard_mut(&mut self) -> &mut QuickAddWizard {
        &mut self.wizard
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Runs a part search and returns the number of candidates found.
    ///
    /// # Errors
    ///
    /// Any error from [`QuickAddWizard::begin_search`] or
    /// [`QuickAddWizard::finish_search`].
    pub async fn search(&mut self, query: &str) -> Result<usize, QuickAddError> {
        let query = self.wizard.begin_search(query)?;
        let result = self.api.search_parts(&query).await;
        self.wizard.finish_search(result)?;
        Ok(self.wizard.candidates().len())
    }

    /// Selects candidate `index`: starts the image prefetch in the background
    /// and loads both directories before returning.
    ///
    /// # Errors
    ///
    /// Any error from [`QuickAddWizard::select_candidate`].
    pub async fn select(&mut self, index: usize) -> Result<(), QuickAddError> {
        let remembered = remembered_location(&self.prefs);
        let entry = self.wizard.select_candidate(index, remembered)?;
        self.spawn_image_search(entry.images);

        let (locations, spec_definitions) = tokio::join!(
            self.api.load_locations(),
            self.api.load_spec_definitions()
        );
        self.wizard
            .finish_directory_load(entry.directory, locations, spec_definitions);
        Ok(())
    }

    /// Starts a manual image search. Returns immediately.
    ///
    /// # Errors
    ///
    /// Any error from [`QuickAddWizard::begin_image_search`].
    pub fn search_images(&mut self, query: &str) -> Result<(), QuickAddError> {
        let ticket = self.wizard.begin_image_search(query)?;
        self.spawn_image_search(ticket);
        Ok(())
    }

    /// Applies every image search response that has already arrived and
    /// returns how many were current.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(delivery) = self.image_rx.try_recv() {
            if self.apply(delivery) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits until the latest image search started by this session has
    /// resolved, then applies everything that has arrived.
    ///
    /// A search task that panics counts as a search with no suggestions.
    pub async fn wait_for_images(&mut self) {
        if let Some((ticket, handle)) = self.image_task.take() {
            if let Err(e) = handle.await {
                tracing::warn!(query = %ticket.query, error = %e, "image search task failed");
                self.wizard.finish_image_search(&ticket, Ok(Vec::new()));
            }
        }
        self.pump();
    }

    /// Validates and commits the form. After a successful create the chosen
    /// location is remembered for the next session, even if some images
    /// failed.
    ///
    /// # Errors
    ///
    /// Any error from [`QuickAddWizard::begin_submit`], or
    /// [`QuickAddError::CreateFailed`] from the pipeline.
    pub async fn submit(&mut self) -> Result<CommitResult, QuickAddError> {
        let ticket = self.wizard.begin_submit()?;
        let result = commit::submit(self.api.as_ref(), ticket.request()).await;

        if result.is_ok() {
            let location = ticket.location_id().to_string();
            if let Err(e) = self.prefs.set(LAST_LOCATION_KEY, &location) {
                tracing::warn!(error = %e, "could not remember last location");
            }
        }
        self.wizard.finish_submit(ticket, result)
    }

    fn spawn_image_search(&mut self, ticket: ImageSearchTicket) {
        let api = Arc::clone(&self.api);
        let tx = self.image_tx.clone();
        tracing::debug!(generation = ticket.generation, query = %ticket.query, "image search started");
        let delivered = ticket.clone();
        let handle = tokio::spawn(async move {
            let result = api.search_images(&delivered.query).await;
            if tx
                .send(ImageDelivery {
                    ticket: delivered,
                    result,
                })
                .is_err()
            {
                tracing::debug!("session dropped before image search finished");
            }
        });
        self.image_task = Some((ticket, handle));
    }

    fn apply(&mut self, delivery: ImageDelivery) -> bool {
        self.wizard
            .finish_image_search(&delivery.ticket, delivery.result)
    }
}

//! Commit pipeline: one atomic create, then a sequential best-effort image
//! batch whose per-item outcomes are aggregated into a [`CommitResult`].

use std::collections::BTreeMap;

use partsbin_core::QuickAddRequest;

use crate::error::QuickAddError;
use crate::form::ValidatedForm;
use crate::gateway::InventoryWriter;

/// Everything needed to commit one confirmation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    form: ValidatedForm,
    images: Vec<String>,
    specs: Option<BTreeMap<String, String>>,
}

impl CommitRequest {
    /// `images` are transferred in the given order.
    #[must_use]
    pub fn new(
        form: ValidatedForm,
        images: Vec<String>,
        spec_values: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            form,
            images,
            specs: build_spec_payload(spec_values),
        }
    }

    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    #[must_use]
    pub fn location_id(&self) -> i64 {
        self.form.location_id
    }

    /// Body of the create request.
    #[must_use]
    pub fn payload(&self) -> QuickAddRequest {
        let form = &self.form;
        QuickAddRequest {
            part_number: form.part_number.clone(),
            name: form.name.clone(),
            description: form.description.clone(),
            manufacturer: form.manufacturer.clone(),
            datasheet_url: form.datasheet_url.clone(),
            specs: self.specs.clone(),
            location_id: form.location_id,
            quantity: form.quantity,
            minimum_quantity: form.minimum_quantity,
            unit_price: form.unit_price,
        }
    }
}

/// Keeps only specification entries with a non-blank value. Returns `None`
/// when nothing is left so the field is omitted from the payload.
#[must_use]
pub fn build_spec_payload(spec_values: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    let specs: BTreeMap<String, String> = spec_values
        .iter()
        .filter_map(|(name, value)| {
            let value = value.trim();
            (!value.is_empty()).then(|| (name.clone(), value.to_string()))
        })
        .collect();
    (!specs.is_empty()).then_some(specs)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutcome {
    pub url: String,
    /// `None` when the image was stored.
    pub error: Option<String>,
}

impl ImageOutcome {
    #[must_use]
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitResult {
    pub created_part_id: i64,
    pub created_stock_entry_id: i64,
    /// One entry per requested image, in transfer order.
    pub image_outcomes: Vec<ImageOutcome>,
}

impl CommitResult {
    #[must_use]
    pub fn failed_images(&self) -> impl Iterator<Item = &ImageOutcome> {
        self.image_outcomes.iter().filter(|o| !o.ok())
    }

    #[must_use]
    pub fn report(&self) -> CommitReport {
        let mut failures = self.failed_images();
        match failures.next() {
            None => CommitReport::Complete {
                part_id: self.created_part_id,
            },
            Some(first) => {
                let overflow = failures.count();
                CommitReport::Partial {
                    part_id: self.created_part_id,
                    failed: overflow + 1,
                    first_error: first.error.clone().unwrap_or_default(),
                    overflow,
                }
            }
        }
    }
}

/// What the shell should show after a commit that created the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitReport {
    /// Every image (possibly none) was stored; navigate to the part.
    Complete { part_id: i64 },
    /// The part exists but some images failed. Stay and offer a link.
    Partial {
        part_id: i64,
        failed: usize,
        first_error: String,
        overflow: usize,
    },
}

impl CommitReport {
    #[must_use]
    pub fn part_id(&self) -> i64 {
        match self {
            CommitReport::Complete { part_id } | CommitReport::Partial { part_id, .. } => *part_id,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, CommitReport::Complete { .. })
    }

    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            CommitReport::Complete { part_id } => format!("created part {part_id}"),
            CommitReport::Partial {
                part_id,
                failed,
                first_error,
                overflow,
            } => {
                let noun = if *failed == 1 { "image" } else { "images" };
                let mut text =
                    format!("created part {part_id}, but {failed} {noun} could not be attached: {first_error}");
                if *overflow > 0 {
                    text.push_str(&format!(" (+{overflow} more)"));
                }
                text
            }
        }
    }
}

/// Creates the part and its stock entry, then transfers each requested image
/// one at a time. A failed image never stops the batch nor undoes the create.
///
/// # Errors
///
/// Returns [`QuickAddError::CreateFailed`] if the create request fails; no
/// image transfer is attempted in that case.
pub async fn submit<W: InventoryWriter>(
    writer: &W,
    request: &CommitRequest,
) -> Result<CommitResult, QuickAddError> {
    let payload = request.payload();
    let created = writer
        .create_part_with_stock(&payload)
        .await
        .map_err(|e| QuickAddError::CreateFailed(e.to_string()))?;
    let part_id = created.part.id;
    if !request.images.is_empty() {
        tracing::info!(part_id, images = request.images.len(), "transferring selected images");
    }

    let mut image_outcomes = Vec::with_capacity(request.images.len());
    for url in &request.images {
        let error = match transfer_image(writer, part_id, url).await {
            Ok(()) => None,
            Err(message) => {
                tracing::warn!(part_id, url = %url, error = %message, "image transfer failed");
                Some(message)
            }
        };
        image_outcomes.push(ImageOutcome {
            url: url.clone(),
            error,
        });
    }

    Ok(CommitResult {
        created_part_id: part_id,
        created_stock_entry_id: created.stock_entry.id,
        image_outcomes,
    })
}

async fn transfer_image<W: InventoryWriter>(
    writer: &W,
    part_id: i64,
    url: &str,
) -> Result<(), String> {
    let fetch_url = writer.resolve_fetch_url(url);
    let image = writer
        .fetch_image(&fetch_url)
        .await
        .map_err(|e| format!("download failed: {e}"))?;
    let stored = writer
        .upload_image(part_id, image)
        .await
        .map_err(|e| format!("upload failed: {e}"))?;
    tracing::debug!(part_id, image_id = stored.id, url = %url, "image attached");
    Ok(())
}

use partsbin_core::{Location, SpecDefinition};

use super::InventoryClient;
use crate::error::ClientError;

impl InventoryClient {
    /// Fetches every stock location.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on HTTP failure or an unexpected response shape.
    pub async fn list_locations(&self) -> Result<Vec<Location>, ClientError> {
        let url = self.build_url("locations", &[])?;
        self.get_json(&url, "locations").await
    }

    /// Fetches the global specification-field definitions, sorted by
    /// `display_order` then name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on HTTP failure or an unexpected response shape.
    pub async fn list_spec_definitions(&self) -> Result<Vec<SpecDefinition>, ClientError> {
        let url = self.build_url("spec-definitions", &[])?;
        let mut definitions: Vec<SpecDefinition> = self.get_json(&url, "spec-definitions").await?;
        definitions.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(definitions)
    }
}

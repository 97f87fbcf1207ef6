use partsbin_core::{ImageSuggestion, SearchCandidate};

use super::InventoryClient;
use crate::error::ClientError;

impl InventoryClient {
    /// Looks up candidate parts for a free-text description.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the search backend answers with an error.
    /// - [`ClientError::Http`] on network failure after retries.
    /// - [`ClientError::Deserialize`] if the response is not a candidate list.
    pub async fn search_parts(&self, query: &str) -> Result<Vec<SearchCandidate>, ClientError> {
        let url = self.build_url("parts-search", &[("q", query)])?;
        let candidates: Vec<SearchCandidate> = self
            .get_json(&url, &format!("parts-search(q={query})"))
            .await?;
        tracing::debug!(query, count = candidates.len(), "part search returned");
        Ok(candidates)
    }

    /// Looks up candidate images for a free-text description.
    ///
    /// # Errors
    ///
    /// Same as [`InventoryClient::search_parts`]. Callers in the Quick-Add
    /// flow treat any error as "no suggestions".
    pub async fn search_images(&self, query: &str) -> Result<Vec<ImageSuggestion>, ClientError> {
        let url = self.build_url("parts-search/images", &[("q", query)])?;
        let suggestions: Vec<ImageSuggestion> = self
            .get_json(&url, &format!("parts-search/images(q={query})"))
            .await?;
        tracing::debug!(query, count = suggestions.len(), "image search returned");
        Ok(suggestions)
    }
}

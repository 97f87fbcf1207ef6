use partsbin_core::{QuickAddRequest, QuickAddResponse};

use super::{check_status, InventoryClient};
use crate::error::ClientError;

impl InventoryClient {
    /// Creates a part together with its first stock entry in one request.
    ///
    /// Not retried: a timeout after the server committed would otherwise
    /// produce a duplicate-part error on the second attempt.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the server rejects the payload (e.g. the part
    ///   number already exists); the message is the server's.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the response shape is unexpected.
    pub async fn quick_add(
        &self,
        request: &QuickAddRequest,
    ) -> Result<QuickAddResponse, ClientError> {
        let url = self.build_url("parts/quick-add", &[])?;
        let response = self.client.post(url).json(request).send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        let created: QuickAddResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: format!("parts/quick-add(partNumber={})", request.part_number),
                source: e,
            })?;
        tracing::info!(
            part_id = created.part.id,
            stock_entry_id = created.stock_entry.id,
            part_number = %created.part.part_number,
            "part created"
        );
        Ok(created)
    }
}

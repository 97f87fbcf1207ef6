//! Collaborator seams consumed by the wizard and the commit pipeline.
//!
//! [`InventoryClient`] implements all three traits; tests substitute
//! in-memory fakes.

use std::future::Future;

use partsbin_client::{ClientError, FetchedImage, InventoryClient};
use partsbin_core::{
    ImageSuggestion, Location, PartImage, QuickAddRequest, QuickAddResponse, SearchCandidate,
    SpecDefinition,
};

pub trait SearchGateway: Send + Sync {
    fn search_parts(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<SearchCandidate>, ClientError>> + Send;

    fn search_images(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<ImageSuggestion>, ClientError>> + Send;
}

pub trait DirectoryLoader: Send + Sync {
    fn load_locations(&self) -> impl Future<Output = Result<Vec<Location>, ClientError>> + Send;

    fn load_spec_definitions(
        &self,
    ) -> impl Future<Output = Result<Vec<SpecDefinition>, ClientError>> + Send;
}

/// Write side used by the commit pipeline.
pub trait InventoryWriter: Send + Sync {
    fn create_part_with_stock(
        &self,
        request: &QuickAddRequest,
    ) -> impl Future<Output = Result<QuickAddResponse, ClientError>> + Send;

    /// URL the bytes of `source` should be fetched from.
    fn resolve_fetch_url(&self, source: &str) -> String;

    fn fetch_image(
        &self,
        fetch_url: &str,
    ) -> impl Future<Output = Result<FetchedImage, ClientError>> + Send;

    fn upload_image(
        &self,
        part_id: i64,
        image: FetchedImage,
    ) -> impl Future<Output = Result<PartImage, ClientError>> + Send;
}

impl SearchGateway for InventoryClient {
    async fn search_parts(&self, query: &str) -> Result<Vec<SearchCandidate>, ClientError> {
        InventoryClient::search_parts(self, query).await
    }

    async fn search_images(&self, query: &str) -> Result<Vec<ImageSuggestion>, ClientError> {
        InventoryClient::search_images(self, query).await
    }
}

impl DirectoryLoader for InventoryClient {
    async fn load_locations(&self) -> Result<Vec<Location>, ClientError> {
        self.list_locations().await
    }

    async fn load_spec_definitions(&self) -> Result<Vec<SpecDefinition>, ClientError> {
        self.list_spec_definitions().await
    }
}

impl InventoryWriter for InventoryClient {
    async fn create_part_with_stock(
        &self,
        request: &QuickAddRequest,
    ) -> Result<QuickAddResponse, ClientError> {
        self.quick_add(request).await
    }

    fn resolve_fetch_url(&self, source: &str) -> String {
        self.resolver().resolve(source)
    }

    async fn fetch_image(&self, fetch_url: &str) -> Result<FetchedImage, ClientError> {
        InventoryClient::fetch_image(self, fetch_url).await
    }

    async fn upload_image(&self, part_id: i64, image: FetchedImage) -> Result<PartImage, ClientError> {
        InventoryClient::upload_image(self, part_id, image).await
    }
}

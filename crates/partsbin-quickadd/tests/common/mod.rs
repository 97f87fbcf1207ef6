//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use partsbin_client::{ClientError, FetchedImage};
use partsbin_core::{
    CreatedPart, CreatedStockEntry, ImageSuggestion, Location, PartImage, QuickAddRequest,
    QuickAddResponse, SearchCandidate, SpecDataType, SpecDefinition,
};
use partsbin_quickadd::{DirectoryLoader, InventoryWriter, SearchGateway};

pub const PART_ID: i64 = 42;
pub const STOCK_ENTRY_ID: i64 = 7;

pub fn candidate(mpn: &str, specs: &[&str]) -> SearchCandidate {
    SearchCandidate {
        mpn: mpn.to_owned(),
        manufacturer: Some("Texas Instruments".to_owned()),
        short_description: Some("Precision timer".to_owned()),
        datasheet_url: None,
        category: Some("Timers".to_owned()),
        specs: specs.iter().map(|s| (*s).to_owned()).collect(),
    }
}

pub fn spec_def(id: i64, name: &str) -> SpecDefinition {
    SpecDefinition {
        id,
        name: name.to_owned(),
        data_type: SpecDataType::Text,
        unit: None,
        options: Vec::new(),
        display_order: 0,
    }
}

/// Suggestions returned for `query`: three URLs derived from it.
pub fn suggestions_for(query: &str) -> Vec<ImageSuggestion> {
    let slug = query.replace(' ', "-");
    (1..=3)
        .map(|i| ImageSuggestion {
            url: format!("https://img.test/{slug}/{i}.jpg"),
            thumbnail_url: Some(format!("https://img.test/{slug}/{i}-thumb.jpg")),
            description: None,
        })
        .collect()
}

fn api_error(status: u16, message: &str) -> ClientError {
    ClientError::Api {
        status,
        message: message.to_owned(),
    }
}

/// Scriptable stand-in for the inventory API that records every call.
pub struct FakeApi {
    pub candidates: Vec<SearchCandidate>,
    pub search_error: Option<String>,
    pub locations: Vec<Location>,
    pub spec_definitions: Vec<SpecDefinition>,
    pub create_error: Option<String>,
    pub failing_fetch: HashSet<String>,
    pub failing_upload: HashSet<String>,
    pub image_delays: HashMap<String, Duration>,
    /// Image queries whose search task panics instead of answering.
    pub crashing_image_queries: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
    pub created: Mutex<Vec<QuickAddRequest>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            candidates: vec![
                candidate("NE555P", &["Voltage: 5V", "Color: Red"]),
                candidate("LM358N", &["Package: DIP-8"]),
            ],
            search_error: None,
            locations: vec![
                Location {
                    id: 1,
                    name: "Drawer A".to_owned(),
                    description: None,
                },
                Location {
                    id: 2,
                    name: "Shelf B".to_owned(),
                    description: Some("top shelf".to_owned()),
                },
            ],
            spec_definitions: vec![spec_def(1, "Voltage"), spec_def(2, "Package")],
            create_error: None,
            failing_fetch: HashSet::new(),
            failing_upload: HashSet::new(),
            image_delays: HashMap::new(),
            crashing_image_queries: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<QuickAddRequest> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SearchGateway for FakeApi {
    async fn search_parts(&self, query: &str) -> Result<Vec<SearchCandidate>, ClientError> {
        self.record(format!("search_parts:{query}"));
        match &self.search_error {
            Some(message) => Err(api_error(503, message)),
            None => Ok(self.candidates.clone()),
        }
    }

    async fn search_images(&self, query: &str) -> Result<Vec<ImageSuggestion>, ClientError> {
        self.record(format!("search_images:{query}"));
        if let Some(delay) = self.image_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        assert!(
            !self.crashing_image_queries.contains(query),
            "image backend crashed on {query}"
        );
        Ok(suggestions_for(query))
    }
}

impl DirectoryLoader for FakeApi {
    async fn load_locations(&self) -> Result<Vec<Location>, ClientError> {
        Ok(self.locations.clone())
    }

    async fn load_spec_definitions(&self) -> Result<Vec<SpecDefinition>, ClientError> {
        Ok(self.spec_definitions.clone())
    }
}

impl InventoryWriter for FakeApi {
    async fn create_part_with_stock(
        &self,
        request: &QuickAddRequest,
    ) -> Result<QuickAddResponse, ClientError> {
        self.record("create".to_owned());
        if let Some(message) = &self.create_error {
            return Err(api_error(409, message));
        }
        self.created.lock().unwrap().push(request.clone());
        Ok(QuickAddResponse {
            part: CreatedPart {
                id: PART_ID,
                part_number: request.part_number.clone(),
                name: request.name.clone(),
            },
            stock_entry: CreatedStockEntry {
                id: STOCK_ENTRY_ID,
                part_id: PART_ID,
                location_id: request.location_id,
                quantity: request.quantity,
                minimum_quantity: request.minimum_quantity,
            },
        })
    }

    fn resolve_fetch_url(&self, source: &str) -> String {
        format!("proxy:{source}")
    }

    async fn fetch_image(&self, fetch_url: &str) -> Result<FetchedImage, ClientError> {
        self.record(format!("fetch:{fetch_url}"));
        let source = fetch_url.trim_start_matches("proxy:");
        if self.failing_fetch.contains(source) {
            return Err(api_error(502, "remote host refused the request"));
        }
        Ok(FetchedImage {
            bytes: source.as_bytes().to_vec(),
            content_type: "image/png".to_owned(),
        })
    }

    async fn upload_image(
        &self,
        part_id: i64,
        image: FetchedImage,
    ) -> Result<PartImage, ClientError> {
        let source = String::from_utf8(image.bytes).unwrap();
        self.record(format!("upload:{source}"));
        if self.failing_upload.contains(&source) {
            return Err(api_error(400, "Maximum of 5 images per part"));
        }
        Ok(PartImage {
            id: 100,
            part_id,
            display_order: 0,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        })
    }
}

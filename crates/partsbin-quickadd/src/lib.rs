//! Quick-Add acquisition flow: search for a part, pick a candidate, confirm
//! its details while image suggestions load, then create it and attach the
//! chosen images.

pub mod commit;
pub mod error;
pub mod form;
pub mod gateway;
pub mod prefs;
pub mod session;
pub mod wizard;

pub use commit::{submit, CommitReport, CommitRequest, CommitResult, ImageOutcome};
pub use error::{FieldError, QuickAddError};
pub use form::{ConfirmForm, FormField, ValidatedForm};
pub use gateway::{DirectoryLoader, InventoryWriter, SearchGateway};
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore, LAST_LOCATION_KEY};
pub use session::{QuickAddApi, QuickAddSession};
pub use wizard::{QuickAddWizard, Step, MAX_ATTACHED_IMAGES};

//! The confirmation form: a mutable working copy seeded from a search
//! candidate, and the validation gate in front of the commit pipeline.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use partsbin_core::{SearchCandidate, SpecDefinition};
use rust_decimal::Decimal;

use crate::error::FieldError;

/// Both quantities start at 1.
const DEFAULT_QUANTITY: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    PartNumber,
    Name,
    Description,
    Manufacturer,
    DatasheetUrl,
    Location,
    Quantity,
    MinimumQuantity,
    UnitPrice,
}

impl FormField {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FormField::PartNumber => "Part number",
            FormField::Name => "Name",
            FormField::Description => "Description",
            FormField::Manufacturer => "Manufacturer",
            FormField::DatasheetUrl => "Datasheet URL",
            FormField::Location => "Location",
            FormField::Quantity => "Quantity",
            FormField::MinimumQuantity => "Minimum quantity",
            FormField::UnitPrice => "Unit price",
        }
    }
}

/// Text-valued working record edited during the confirmation step.
///
/// Every key in the spec-value map names a loaded [`SpecDefinition`]; the
/// map is rebuilt from scratch whenever definitions are (re)loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmForm {
    pub part_number: String,
    pub name: String,
    pub description: String,
    pub manufacturer: String,
    pub datasheet_url: String,
    pub location_id: String,
    pub quantity: String,
    pub minimum_quantity: String,
    pub unit_price: String,
    /// Raw `"Name: Value"` specs copied from the selected candidate.
    pub specs_raw: Vec<String>,
    spec_values: BTreeMap<String, String>,
}

impl ConfirmForm {
    #[must_use]
    pub fn from_candidate(candidate: &SearchCandidate) -> Self {
        Self {
            part_number: candidate.mpn.clone(),
            name: candidate
                .short_description
                .clone()
                .unwrap_or_else(|| candidate.mpn.clone()),
            description: candidate.short_description.clone().unwrap_or_default(),
            manufacturer: candidate.manufacturer.clone().unwrap_or_default(),
            datasheet_url: candidate.datasheet_url.clone().unwrap_or_default(),
            location_id: String::new(),
            quantity: DEFAULT_QUANTITY.to_string(),
            minimum_quantity: DEFAULT_QUANTITY.to_string(),
            unit_price: String::new(),
            specs_raw: candidate.specs.clone(),
            spec_values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::PartNumber => &self.part_number,
            FormField::Name => &self.name,
            FormField::Description => &self.description,
            FormField::Manufacturer => &self.manufacturer,
            FormField::DatasheetUrl => &self.datasheet_url,
            FormField::Location => &self.location_id,
            FormField::Quantity => &self.quantity,
            FormField::MinimumQuantity => &self.minimum_quantity,
            FormField::UnitPrice => &self.unit_price,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::PartNumber => self.part_number = value,
            FormField::Name => self.name = value,
            FormField::Description => self.description = value,
            FormField::Manufacturer => self.manufacturer = value,
            FormField::DatasheetUrl => self.datasheet_url = value,
            FormField::Location => self.location_id = value,
            FormField::Quantity => self.quantity = value,
            FormField::MinimumQuantity => self.minimum_quantity = value,
            FormField::UnitPrice => self.unit_price = value,
        }
    }

    /// Current value per specification field name.
    #[must_use]
    pub fn spec_values(&self) -> &BTreeMap<String, String> {
        &self.spec_values
    }

    /// Replaces all spec values with ones pre-filled from `specs_raw`.
    pub(crate) fn prefill_specs(&mut self, definitions: &[SpecDefinition]) {
        self.spec_values = prefill_spec_values(definitions, &self.specs_raw);
    }

    /// Sets one spec value. Returns `false` if `name` is not a current key.
    pub(crate) fn set_spec_value(&mut self, name: &str, value: String) -> bool {
        match self.spec_values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Runs every local check and returns the typed values, or every
    /// field-level failure at once.
    ///
    /// # Errors
    ///
    /// Returns the list of [`FieldError`]s when any field is invalid.
    pub fn validate(&self) -> Result<ValidatedForm, Vec<FieldError>> {
        let mut errors = Vec::new();

        let part_number = self.part_number.trim();
        if part_number.is_empty() {
            errors.push(FieldError::new(FormField::PartNumber, "is required"));
        }
        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::new(FormField::Name, "is required"));
        }

        let location_id = match self.location_id.trim() {
            "" => {
                errors.push(FieldError::new(FormField::Location, "select a location"));
                None
            }
            raw => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push(FieldError::new(FormField::Location, "is not a valid location"));
                    None
                }
            },
        };

        let quantity = parse_count(FormField::Quantity, &self.quantity, &mut errors);
        let minimum_quantity =
            parse_count(FormField::MinimumQuantity, &self.minimum_quantity, &mut errors);

        let unit_price = match self.unit_price.trim() {
            "" => None,
            raw => match Decimal::from_str(raw) {
                Ok(price) if price.is_sign_negative() && !price.is_zero() => {
                    errors.push(FieldError::new(FormField::UnitPrice, "must be 0 or more"));
                    None
                }
                Ok(price) => Some(price),
                Err(_) => {
                    errors.push(FieldError::new(FormField::UnitPrice, "must be a number"));
                    None
                }
            },
        };

        match (location_id, quantity, minimum_quantity) {
            (Some(location_id), Some(quantity), Some(minimum_quantity)) if errors.is_empty() => {
                Ok(ValidatedForm {
                    part_number: part_number.to_string(),
                    name: name.to_string(),
                    description: non_blank(&self.description),
                    manufacturer: non_blank(&self.manufacturer),
                    datasheet_url: non_blank(&self.datasheet_url),
                    location_id,
                    quantity,
                    minimum_quantity,
                    unit_price,
                })
            }
            _ => Err(errors),
        }
    }
}

/// A form that passed [`ConfirmForm::validate`]. Only obtainable through
/// validation, so the commit pipeline never sees unchecked input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    pub(crate) part_number: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) manufacturer: Option<String>,
    pub(crate) datasheet_url: Option<String>,
    pub(crate) location_id: i64,
    pub(crate) quantity: i32,
    pub(crate) minimum_quantity: i32,
    pub(crate) unit_price: Option<Decimal>,
}

impl ValidatedForm {
    #[must_use]
    pub fn part_number(&self) -> &str {
        &self.part_number
    }

    #[must_use]
    pub fn location_id(&self) -> i64 {
        self.location_id
    }
}

/// Splits a raw spec string on the first `": "` into a trimmed name/value.
#[must_use]
pub fn parse_spec_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(": ")?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

/// Builds the initial spec-value map: one entry per definition, filled from
/// the candidate's raw specs by exact name match, empty otherwise. Raw specs
/// with no matching definition are dropped. A repeated name keeps its last value.
#[must_use]
pub fn prefill_spec_values(
    definitions: &[SpecDefinition],
    specs_raw: &[String],
) -> BTreeMap<String, String> {
    let parsed: HashMap<&str, &str> = specs_raw
        .iter()
        .filter_map(|line| parse_spec_line(line))
        .collect();

    definitions
        .iter()
        .map(|def| {
            let value = parsed.get(def.name.as_str()).copied().unwrap_or_default();
            (def.name.clone(), value.to_string())
        })
        .collect()
}

fn parse_count(field: FormField, raw: &str, errors: &mut Vec<FieldError>) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(FieldError::new(field, "is required"));
        return None;
    }
    match raw.parse::<i32>() {
        Ok(n) if n < 0 => {
            errors.push(FieldError::new(field, "must be 0 or more"));
            None
        }
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(FieldError::new(field, "must be a whole number"));
            None
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

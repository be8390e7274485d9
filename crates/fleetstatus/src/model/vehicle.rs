//! Vehicles, their documentation deadlines and repair details.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::Update;

use super::validation::{ValidationError, Validator};
use super::{Record, RecordId};

/// Operational state of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    /// The vehicle runs.
    Running,
    /// The vehicle needs repair before it can be used.
    NonRunning,
}

impl Condition {
    /// The stored representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::NonRunning => "NON_RUNNING",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "NON_RUNNING" => Ok(Self::NonRunning),
            other => Err(ValidationError::new(
                "condition",
                format!("expected RUNNING or NON_RUNNING, got '{other}'"),
            )),
        }
    }
}

/// Regulatory due dates attached to a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Documentation {
    /// Date the technical inspection expires.
    pub inspection_due: NaiveDate,
    /// Date the road tax expires.
    pub tax_due: NaiveDate,
}

/// What is wrong with a non-running vehicle and what fixing it will take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonRunningDetails {
    /// What needs to be fixed.
    pub explanation: String,
    /// Estimated repair cost.
    pub estimated_budget: f64,
    /// Estimated date the vehicle runs again.
    pub eta: NaiveDate,
}

/// Why a vehicle is not available today.
#[derive(Debug, Clone, PartialEq)]
pub enum Unavailability {
    /// The vehicle does not run.
    NonRunning {
        /// Repair explanation.
        explanation: String,
    },
    /// The inspection is due today or has lapsed.
    InspectionExpired(NaiveDate),
    /// The road tax is due today or has lapsed.
    TaxExpired(NaiveDate),
}

impl fmt::Display for Unavailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonRunning { explanation } => write!(f, "not running: {explanation}"),
            Self::InspectionExpired(date) => write!(f, "inspection expired on {date}"),
            Self::TaxExpired(date) => write!(f, "tax expired on {date}"),
        }
    }
}

/// Payload for creating a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    /// Display name.
    pub alias: String,
    /// Optional photo URL.
    pub photo_url: Option<String>,
    /// Operational state.
    pub condition: Condition,
    /// Repair details; required exactly when `condition` is non-running.
    pub non_running_details: Option<NonRunningDetails>,
    /// Due dates.
    pub documentation: Documentation,
    /// Where the vehicle is.
    pub location: String,
}

impl NewVehicle {
    /// Check the payload without constructing a vehicle.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_vehicle(
            &self.alias,
            &self.location,
            self.condition,
            self.non_running_details.as_ref(),
        )
    }
}

/// Cross-field rules shared by new payloads and stored documents.
fn check_vehicle(
    alias: &str,
    location: &str,
    condition: Condition,
    details: Option<&NonRunningDetails>,
) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.require_text("alias", alias);
    v.require_text("location", location);

    match (condition, details) {
        (Condition::NonRunning, Some(details)) => {
            v.require_text("non_running_details.explanation", &details.explanation);
            v.require_non_negative(
                "non_running_details.estimated_budget",
                details.estimated_budget,
            );
        }
        (Condition::NonRunning, None) => v.reject(
            "non_running_details",
            "must be provided when condition is NON_RUNNING",
        ),
        (Condition::Running, Some(_)) => v.reject(
            "non_running_details",
            "must not be provided when condition is RUNNING",
        ),
        (Condition::Running, None) => {}
    }

    v.finish()
}

/// A vehicle of the fleet.
///
/// Values can only be obtained through [`Vehicle::create`] or by decoding a
/// stored document, both of which validate, so the condition and the
/// presence of repair details always agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VehicleDocument")]
pub struct Vehicle {
    #[serde(rename = "_id")]
    id: RecordId,
    alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    condition: Condition,
    #[serde(skip_serializing_if = "Option::is_none")]
    non_running_details: Option<NonRunningDetails>,
    documentation: Documentation,
    location: String,
}

impl Vehicle {
    /// Validate `new` and build a vehicle with a fresh id.
    ///
    /// Surrounding whitespace is stripped from the alias and location.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every offending field.
    pub fn create(new: NewVehicle) -> Result<Self, ValidationError> {
        new.validate()?;
        Ok(Self {
            id: RecordId::generate(),
            alias: new.alias.trim().to_string(),
            photo_url: new.photo_url,
            condition: new.condition,
            non_running_details: new.non_running_details,
            documentation: new.documentation,
            location: new.location.trim().to_string(),
        })
    }

    /// Identifier.
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Photo URL, if any.
    #[must_use]
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Operational state.
    #[must_use]
    pub fn condition(&self) -> Condition {
        self.condition
    }

    /// Repair details; present exactly when the vehicle is non-running.
    #[must_use]
    pub fn non_running_details(&self) -> Option<&NonRunningDetails> {
        self.non_running_details.as_ref()
    }

    /// Due dates.
    #[must_use]
    pub fn documentation(&self) -> &Documentation {
        &self.documentation
    }

    /// Current location.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Whether the vehicle can be used on `today`.
    ///
    /// True when it runs and both documents are due strictly after `today`;
    /// a document due today counts as expired.
    #[must_use]
    pub fn is_available(&self, today: NaiveDate) -> bool {
        self.condition == Condition::Running
            && self.documentation.inspection_due > today
            && self.documentation.tax_due > today
    }

    /// Every reason the vehicle is unavailable on `today`; empty when available.
    #[must_use]
    pub fn unavailability(&self, today: NaiveDate) -> Vec<Unavailability> {
        let mut reasons = Vec::new();
        if let Some(details) = &self.non_running_details {
            reasons.push(Unavailability::NonRunning {
                explanation: details.explanation.clone(),
            });
        }
        if self.documentation.inspection_due <= today {
            reasons.push(Unavailability::InspectionExpired(
                self.documentation.inspection_due,
            ));
        }
        if self.documentation.tax_due <= today {
            reasons.push(Unavailability::TaxExpired(self.documentation.tax_due));
        }
        reasons
    }
}

impl Record for Vehicle {
    const COLLECTION: &'static str = "vehicles";

    type Raw = VehicleDocument;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// The stored shape of a vehicle, before validation.
///
/// Unknown keys are rejected, so derived values such as availability can
/// never end up in a stored vehicle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleDocument {
    /// Identifier.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Display name.
    pub alias: String,
    /// Photo URL.
    #[serde(default)]
    pub photo_url: Option<String>,
    /// Operational state.
    pub condition: Condition,
    /// Repair details.
    #[serde(default)]
    pub non_running_details: Option<NonRunningDetails>,
    /// Due dates.
    pub documentation: Documentation,
    /// Current location.
    pub location: String,
}

impl TryFrom<VehicleDocument> for Vehicle {
    type Error = ValidationError;

    fn try_from(doc: VehicleDocument) -> Result<Self, Self::Error> {
        check_vehicle(
            &doc.alias,
            &doc.location,
            doc.condition,
            doc.non_running_details.as_ref(),
        )?;
        Ok(Self {
            id: doc.id,
            alias: doc.alias.trim().to_string(),
            photo_url: doc.photo_url,
            condition: doc.condition,
            non_running_details: doc.non_running_details,
            documentation: doc.documentation,
            location: doc.location.trim().to_string(),
        })
    }
}

/// A partial update to a stored vehicle.
///
/// Each helper maps to one or more field-path operations. Condition changes
/// always replace `condition` and `non_running_details` together. The merged
/// document is validated before it is written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleUpdate {
    update: Update,
}

impl VehicleUpdate {
    /// Create an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the vehicle.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.update = self.update.set("alias", alias.into());
        self
    }

    /// Move the vehicle.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.update = self.update.set("location", location.into());
        self
    }

    /// Replace the photo URL, or remove it with `None`.
    #[must_use]
    pub fn photo_url(mut self, url: Option<String>) -> Self {
        self.update = self.update.field("photo_url", url.map(Value::String));
        self
    }

    /// Mark the vehicle as running and drop its repair details.
    #[must_use]
    pub fn running(mut self) -> Self {
        self.update = self
            .update
            .set("condition", Condition::Running.as_str())
            .unset("non_running_details");
        self
    }

    /// Mark the vehicle as non-running with the given repair details.
    #[must_use]
    pub fn non_running(mut self, details: &NonRunningDetails) -> Self {
        self.update = self
            .update
            .set("condition", Condition::NonRunning.as_str())
            .set(
                "non_running_details",
                json!({
                    "explanation": details.explanation,
                    "estimated_budget": details.estimated_budget,
                    "eta": details.eta,
                }),
            );
        self
    }

    /// Change the inspection due date.
    #[must_use]
    pub fn inspection_due(mut self, date: NaiveDate) -> Self {
        self.update = self.update.set("documentation.inspection_due", json!(date));
        self
    }

    /// Change the tax due date.
    #[must_use]
    pub fn tax_due(mut self, date: NaiveDate) -> Self {
        self.update = self.update.set("documentation.tax_due", json!(date));
        self
    }

    /// Set a raw field path, or remove it with `None`.
    #[must_use]
    pub fn field(mut self, path: impl Into<String>, value: Option<Value>) -> Self {
        self.update = self.update.field(path, value);
        self
    }

    /// Check whether the update has no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.update.is_empty()
    }

    /// The underlying field-path operations.
    #[must_use]
    pub fn as_update(&self) -> &Update {
        &self.update
    }
}

impl From<Update> for VehicleUpdate {
    fn from(update: Update) -> Self {
        Self { update }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn today() -> NaiveDate {
        date("2026-10-17")
    }

    fn running_payload() -> NewVehicle {
        NewVehicle {
            alias: "Ford Transit".to_string(),
            photo_url: None,
            condition: Condition::Running,
            non_running_details: None,
            documentation: Documentation {
                inspection_due: date("2027-01-01"),
                tax_due: date("2027-06-30"),
            },
            location: "Depot".to_string(),
        }
    }

    fn details() -> NonRunningDetails {
        NonRunningDetails {
            explanation: "Clutch replacement".to_string(),
            estimated_budget: 450.0,
            eta: date("2026-11-01"),
        }
    }

    #[test]
    fn test_create_running_vehicle() {
        let vehicle = Vehicle::create(running_payload()).unwrap();
        assert_eq!(vehicle.alias(), "Ford Transit");
        assert_eq!(vehicle.condition(), Condition::Running);
        assert!(vehicle.non_running_details().is_none());
    }

    #[test]
    fn test_create_non_running_vehicle() {
        let mut payload = running_payload();
        payload.condition = Condition::NonRunning;
        payload.non_running_details = Some(details());
        let vehicle = Vehicle::create(payload).unwrap();
        assert_eq!(vehicle.non_running_details(), Some(&details()));
    }

    #[test]
    fn test_non_running_requires_details() {
        let mut payload = running_payload();
        payload.condition = Condition::NonRunning;
        let err = Vehicle::create(payload).unwrap_err();
        assert_eq!(err.fields(), vec!["non_running_details"]);
    }

    #[test]
    fn test_running_rejects_details() {
        let mut payload = running_payload();
        payload.non_running_details = Some(details());
        let err = Vehicle::create(payload).unwrap_err();
        assert!(err.has_field("non_running_details"));
        assert!(err.to_string().contains("must not be provided"));
    }

    #[test]
    fn test_rejects_blank_alias_and_location() {
        let mut payload = running_payload();
        payload.alias = "  ".to_string();
        payload.location = String::new();
        let err = Vehicle::create(payload).unwrap_err();
        assert_eq!(err.fields(), vec!["alias", "location"]);
    }

    #[test]
    fn test_rejects_bad_details() {
        let mut payload = running_payload();
        payload.condition = Condition::NonRunning;
        payload.non_running_details = Some(NonRunningDetails {
            explanation: String::new(),
            estimated_budget: -1.0,
            eta: date("2026-11-01"),
        });
        let err = Vehicle::create(payload).unwrap_err();
        assert_eq!(
            err.fields(),
            vec![
                "non_running_details.explanation",
                "non_running_details.estimated_budget"
            ]
        );
    }

    #[test]
    fn test_available_when_running_and_documents_valid() {
        let mut payload = running_payload();
        let tomorrow = date("2026-10-18");
        payload.documentation = Documentation {
            inspection_due: tomorrow,
            tax_due: tomorrow,
        };
        let vehicle = Vehicle::create(payload).unwrap();
        assert!(vehicle.is_available(today()));
        assert!(vehicle.unavailability(today()).is_empty());
    }

    #[test]
    fn test_document_due_today_is_expired() {
        let mut payload = running_payload();
        payload.documentation.tax_due = today();
        let vehicle = Vehicle::create(payload).unwrap();
        assert!(!vehicle.is_available(today()));
        assert_eq!(
            vehicle.unavailability(today()),
            vec![Unavailability::TaxExpired(today())]
        );
    }

    #[test]
    fn test_non_running_never_available() {
        let mut payload = running_payload();
        payload.condition = Condition::NonRunning;
        payload.non_running_details = Some(details());
        payload.documentation = Documentation {
            inspection_due: date("2030-01-01"),
            tax_due: date("2030-01-01"),
        };
        let vehicle = Vehicle::create(payload).unwrap();
        assert!(!vehicle.is_available(today()));
        assert!(matches!(
            vehicle.unavailability(today())[0],
            Unavailability::NonRunning { .. }
        ));
    }

    #[test]
    fn test_document_shape() {
        let vehicle = Vehicle::create(running_payload()).unwrap();
        let doc = vehicle.to_document().unwrap();

        assert_eq!(doc["_id"], json!(vehicle.id().as_str()));
        assert_eq!(doc["condition"], json!("RUNNING"));
        assert_eq!(doc["documentation"]["inspection_due"], json!("2027-01-01"));
        assert!(!doc.contains_key("id"));
        assert!(!doc.contains_key("photo_url"));
        assert!(!doc.contains_key("non_running_details"));
        assert!(!doc.contains_key("is_available"));
    }

    #[test]
    fn test_document_round_trip() {
        let mut payload = running_payload();
        payload.condition = Condition::NonRunning;
        payload.non_running_details = Some(details());
        payload.photo_url = Some("file:///photos/ford-transit.jpg".to_string());
        let vehicle = Vehicle::create(payload).unwrap();

        let decoded = Vehicle::from_document(vehicle.to_document().unwrap()).unwrap();
        assert_eq!(decoded, vehicle);
    }

    #[test]
    fn test_decoding_inconsistent_document_fails() {
        let doc = match json!({
            "_id": "v1",
            "alias": "Van",
            "condition": "NON_RUNNING",
            "documentation": {"inspection_due": "2027-01-01", "tax_due": "2027-01-01"},
            "location": "Depot"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = Vehicle::from_document(doc).unwrap_err();
        match err {
            crate::Error::Validation(v) => assert!(v.has_field("non_running_details")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decoding_unknown_condition_fails() {
        let doc = match json!({
            "_id": "v1",
            "alias": "Van",
            "condition": "BROKEN",
            "documentation": {"inspection_due": "2027-01-01", "tax_due": "2027-01-01"},
            "location": "Depot"
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(Vehicle::from_document(doc).unwrap_err().is_validation());
    }

    #[test]
    fn test_decoding_rejects_unknown_keys() {
        let doc = match json!({
            "_id": "v1",
            "alias": "Van",
            "condition": "RUNNING",
            "documentation": {"inspection_due": "2027-01-01", "tax_due": "2027-01-01"},
            "location": "Depot",
            "is_available": true
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = Vehicle::from_document(doc).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("is_available"));
    }

    #[test]
    fn test_create_trims_alias_and_location() {
        let mut payload = running_payload();
        payload.alias = " Ford Transit ".to_string();
        payload.location = "Depot\n".to_string();
        let vehicle = Vehicle::create(payload).unwrap();
        assert_eq!(vehicle.alias(), "Ford Transit");
        assert_eq!(vehicle.location(), "Depot");
    }

    #[test]
    fn test_condition_parse_and_display() {
        assert_eq!("RUNNING".parse::<Condition>().unwrap(), Condition::Running);
        assert_eq!(
            "NON_RUNNING".parse::<Condition>().unwrap(),
            Condition::NonRunning
        );
        assert!("running".parse::<Condition>().is_err());
        assert_eq!(Condition::NonRunning.to_string(), "NON_RUNNING");
    }

    #[test]
    fn test_update_running_unsets_details() {
        let update = VehicleUpdate::new().running();
        let ops: Vec<_> = update.as_update().iter().collect();
        assert_eq!(ops[0], ("condition", Some(&json!("RUNNING"))));
        assert_eq!(ops[1], ("non_running_details", None));
    }

    #[test]
    fn test_update_non_running_sets_both() {
        let update = VehicleUpdate::new().non_running(&details());
        assert!(update.as_update().touches("condition"));
        assert!(update.as_update().touches("non_running_details"));
    }

    #[test]
    fn test_update_nested_dates() {
        let update = VehicleUpdate::new()
            .inspection_due(date("2028-01-01"))
            .tax_due(date("2028-02-01"));
        assert!(update.as_update().touches("documentation.inspection_due"));
        assert!(update.as_update().touches("documentation.tax_due"));
        assert!(!update.is_empty());
    }
}

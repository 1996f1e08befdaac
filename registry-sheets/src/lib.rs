//! Spreadsheet web-app boundary: raw JSON normalization, remote collaborator, and the
//! time-boxed roster cache.

use serde_json::Value;
use tracing::warn;

use registry_core::{
    BacteriologicalStatus, Comorbidities, DiagnosticRecord, Disposition, DrugSusceptibility,
    HivStatus, LabResult, Patient, RecordStatus, RegistryError,
};

pub mod cache;
pub mod remote;

pub use cache::{
    CacheEnvelope, CacheStore, Clock, FileCacheStore, ManualClock, MemoryCacheStore,
    RegistryCache, SystemClock,
};
pub use remote::{patch_payload, save_payload, RemoteStore};
#[cfg(feature = "http")]
pub use remote::HttpRemoteStore;

/// Parse a read response from a JSON string.
pub fn patients_from_str(response_json: &str) -> Result<Vec<Patient>, RegistryError> {
    let value: Value =
        serde_json::from_str(response_json).map_err(|err| RegistryError::Parse(err.to_string()))?;
    Ok(patients_from_response(&value))
}

/// Normalize a `{status, data}` read response. Any status other than `success` yields
/// an empty roster.
pub fn patients_from_response(response: &Value) -> Vec<Patient> {
    match response_rows(response) {
        Ok(rows) => rows.iter().map(normalize_patient).collect(),
        Err(err) => {
            warn!("Discarding registry response: {err}");
            Vec::new()
        }
    }
}

fn response_rows(response: &Value) -> Result<&[Value], RegistryError> {
    let status = response
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if status != "success" {
        return Err(RegistryError::RemoteStatus(if status.is_empty() {
            "<missing>".to_string()
        } else {
            status.to_string()
        }));
    }

    response
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| RegistryError::MissingData("data".to_string()))
}

/// Coerce one loosely-typed row into a `Patient`. Never fails: every field falls back to
/// its default.
pub fn normalize_patient(raw: &Value) -> Patient {
    let initial_disposition = enum_field(raw, "initialDisposition", Disposition::from_label);
    let final_disposition =
        enum_field(raw, "finalDisposition", Disposition::from_label).or(initial_disposition);

    Patient {
        id: text_field(raw, "id"),
        hospital_number: text_field(raw, "hospitalNumber"),
        last_name: text_field(raw, "lastName"),
        first_name: text_field(raw, "firstName"),
        dob: text_field(raw, "dob"),
        sex: text_field(raw, "sex"),
        civil_status: text_field(raw, "civilStatus"),
        brgy: text_field(raw, "brgy"),
        city: text_field(raw, "city"),
        date_of_admission: text_field(raw, "dateOfAdmission"),
        area_ward: text_field(raw, "areaWard"),
        doctor_in_charge: text_field(raw, "doctorInCharge"),
        initial_disposition,
        xpert_history: history_field(raw, "xpertHistory"),
        smear_history: history_field(raw, "smearHistory"),
        bacteriological_status: enum_field(
            raw,
            "bacteriologicalStatus",
            BacteriologicalStatus::from_label,
        )
        .unwrap_or_default(),
        anatomical_site: text_field(raw, "anatomicalSite"),
        extra_pulmonary_site: optional_text(raw, "extraPulmonarySite"),
        drug_susceptibility: enum_field(raw, "drugSusceptibility", DrugSusceptibility::from_label)
            .unwrap_or_default(),
        treatment_history: text_field(raw, "treatmentHistory"),
        treatment_started: flag_field(raw, "treatmentStarted"),
        treatment_start_date: optional_text(raw, "treatmentStartDate"),
        treatment_regimen: optional_text(raw, "treatmentRegimen"),
        treatment_regimen_notes: optional_text(raw, "treatmentRegimenNotes"),
        comorbidities: comorbidities_field(raw),
        hiv_test_result: enum_field(raw, "hivTestResult", HivStatus::from_label)
            .unwrap_or_default(),
        started_on_art: flag_field(raw, "startedOnArt"),
        final_disposition,
        final_disposition_date: optional_text(raw, "finalDispositionDate"),
        status: match text_field(raw, "status").as_str() {
            "Archived" => RecordStatus::Archived,
            _ => RecordStatus::Active,
        },
        created_at: text_field(raw, "createdAt"),
    }
}

fn text_field(raw: &Value, key: &str) -> String {
    raw.get(key).map(value_text).unwrap_or_default()
}

// Sheets hands numeric-looking cells (hospital numbers, ids) back as numbers.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn optional_text(raw: &Value, key: &str) -> Option<String> {
    let text = text_field(raw, key);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn enum_field<T>(raw: &Value, key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    raw.get(key).and_then(Value::as_str).and_then(parse)
}

/// Literal `true`, or the strings `"true"` / `"TRUE"`. Anything else is false.
fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text == "true" || text == "TRUE",
        _ => false,
    }
}

fn flag_field(raw: &Value, key: &str) -> bool {
    raw.get(key).is_some_and(coerce_flag)
}

fn comorbidities_field(raw: &Value) -> Comorbidities {
    let Some(obj) = raw.get("comorbidities").filter(|value| value.is_object()) else {
        return Comorbidities::default();
    };

    Comorbidities {
        diabetes: flag_field(obj, "diabetes"),
        substance_abuse: flag_field(obj, "substanceAbuse"),
        liver_disease: flag_field(obj, "liverDisease"),
        renal_disease: flag_field(obj, "renalDisease"),
        others: text_field(obj, "others"),
    }
}

fn history_field(raw: &Value, key: &str) -> Vec<DiagnosticRecord> {
    let Some(entries) = raw.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| DiagnosticRecord {
            id: optional_text(entry, "id"),
            date: text_field(entry, "date"),
            result: lab_result(entry),
        })
        .collect()
}

fn lab_result(entry: &Value) -> LabResult {
    let label = text_field(entry, "result");
    if label.trim().is_empty() {
        return LabResult::Pending;
    }
    LabResult::from_label(&label).unwrap_or(LabResult::Indeterminate)
}

//! Liệt kê các trường bắt buộc còn bỏ trống.

use serde::{Deserialize, Serialize};

use crate::latest::is_pending;
use crate::{BacteriologicalStatus, Disposition, DrugSusceptibility, HivStatus, Patient};

/// Trường còn thiếu. Thứ tự khai báo là thứ tự hiển thị.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MissingField {
    #[serde(rename = "Xpert Result")]
    XpertResult,
    #[serde(rename = "Smear Result")]
    SmearResult,
    #[serde(rename = "HIV Status")]
    HivStatus,
    #[serde(rename = "Drug Susc.")]
    DrugSusceptibility,
    #[serde(rename = "Final Disposition")]
    FinalDisposition,
    #[serde(rename = "Classification")]
    Classification,
}

impl MissingField {
    pub fn label(self) -> &'static str {
        match self {
            Self::XpertResult => "Xpert Result",
            Self::SmearResult => "Smear Result",
            Self::HivStatus => "HIV Status",
            Self::DrugSusceptibility => "Drug Susc.",
            Self::FinalDisposition => "Final Disposition",
            Self::Classification => "Classification",
        }
    }
}

pub fn missing_fields(patient: &Patient) -> Vec<MissingField> {
    let mut missing = Vec::new();

    if is_pending(&patient.xpert_history) {
        missing.push(MissingField::XpertResult);
    }
    if is_pending(&patient.smear_history) {
        missing.push(MissingField::SmearResult);
    }
    if matches!(
        patient.hiv_test_result,
        HivStatus::Unknown | HivStatus::Pending
    ) {
        missing.push(MissingField::HivStatus);
    }
    if patient.drug_susceptibility == DrugSusceptibility::Unknown {
        missing.push(MissingField::DrugSusceptibility);
    }
    if looks_concluded_without_outcome(patient) {
        missing.push(MissingField::FinalDisposition);
    }
    if patient.bacteriological_status == BacteriologicalStatus::Pending {
        missing.push(MissingField::Classification);
    }

    missing
}

pub fn missing_labels(patient: &Patient) -> Vec<&'static str> {
    missing_fields(patient)
        .into_iter()
        .map(MissingField::label)
        .collect()
}

pub fn is_complete(patient: &Patient) -> bool {
    missing_fields(patient).is_empty()
}

fn looks_concluded_without_outcome(patient: &Patient) -> bool {
    patient.final_disposition.is_none()
        && matches!(
            patient.initial_disposition,
            Some(
                Disposition::Discharged
                    | Disposition::Expired
                    | Disposition::TransferredOut
                    | Disposition::LostToFollowUp
            )
        )
}

//! Bộ lọc danh sách ca: ghép các điều kiện độc lập bằng AND.

use serde::{Deserialize, Serialize};

use crate::completeness::missing_fields;
use crate::latest::{is_pending, resolve_latest};
use crate::status::{effective_status, is_active};
use crate::{
    BacteriologicalStatus, DiagnosticRecord, Disposition, MissingField, Patient, RegistryError,
};

/// Giá trị "tất cả" của các hộp chọn.
pub const ALL: &str = "All";
/// Nhãn chế độ lọc ca đang điều trị.
pub const ACTIVE_CASES: &str = "Active Cases";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutcomeFilter {
    #[default]
    All,
    ActiveCases,
    /// So khớp chính xác với `finalDisposition`.
    Exactly(Disposition),
}

impl OutcomeFilter {
    pub fn from_label(label: &str) -> Result<Self, RegistryError> {
        match label.trim() {
            "" | ALL => Ok(Self::All),
            ACTIVE_CASES => Ok(Self::ActiveCases),
            other => Disposition::from_label(other)
                .map(Self::Exactly)
                .ok_or_else(|| RegistryError::Parse(format!("Kết cục không hợp lệ: {other}"))),
        }
    }

    fn matches(self, patient: &Patient) -> bool {
        match self {
            Self::All => true,
            Self::ActiveCases => is_active(patient),
            Self::Exactly(disposition) => patient.final_disposition == Some(disposition),
        }
    }
}

/// Thẻ tổng quan được chọn, dùng lại làm điều kiện lọc.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CardFilter {
    TotalActive,
    Admitted,
    ErLevel,
    PendingLabs,
    InactiveMissing,
}

impl CardFilter {
    pub fn from_key(key: &str) -> Result<Self, RegistryError> {
        match key.trim() {
            "totalActive" => Ok(Self::TotalActive),
            "admitted" => Ok(Self::Admitted),
            "erLevel" => Ok(Self::ErLevel),
            "pendingLabs" => Ok(Self::PendingLabs),
            "inactiveMissing" => Ok(Self::InactiveMissing),
            other => Err(RegistryError::Parse(format!("Thẻ lọc không hợp lệ: {other}"))),
        }
    }

    /// Cùng điều kiện với bộ đếm tương ứng trong `DashboardStats`.
    pub fn matches(self, patient: &Patient) -> bool {
        match self {
            Self::TotalActive => is_active(patient),
            Self::Admitted => effective_status(patient) == Some(Disposition::Admitted),
            Self::ErLevel => effective_status(patient) == Some(Disposition::ErLevel),
            Self::PendingLabs => {
                is_active(patient)
                    && (is_pending(&patient.xpert_history) || is_pending(&patient.smear_history))
            }
            Self::InactiveMissing => !is_active(patient) && !missing_fields(patient).is_empty(),
        }
    }
}

/// Các điều kiện lọc đang bật. `None` nghĩa là không ràng buộc.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistryQuery {
    pub search: String,
    pub ward: Option<String>,
    pub outcome: OutcomeFilter,
    pub classification: Option<BacteriologicalStatus>,
    pub card: Option<CardFilter>,
}

impl RegistryQuery {
    /// Dựng truy vấn từ giá trị thô của các hộp chọn; `"All"` hoặc chuỗi rỗng tắt điều kiện.
    pub fn from_selectors(
        search: &str,
        ward: &str,
        outcome: &str,
        classification: &str,
        card: Option<&str>,
    ) -> Result<Self, RegistryError> {
        let ward = match ward.trim() {
            "" | ALL => None,
            other => Some(other.to_string()),
        };

        let classification = match classification.trim() {
            "" | ALL => None,
            other => Some(BacteriologicalStatus::from_label(other).ok_or_else(|| {
                RegistryError::Parse(format!("Phân loại không hợp lệ: {other}"))
            })?),
        };

        let card = card
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(CardFilter::from_key)
            .transpose()?;

        Ok(Self {
            search: search.to_string(),
            ward,
            outcome: OutcomeFilter::from_label(outcome)?,
            classification,
            card,
        })
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        self.matches_search(patient)
            && self
                .ward
                .as_ref()
                .map_or(true, |ward| &patient.area_ward == ward)
            && self.outcome.matches(patient)
            && self
                .classification
                .map_or(true, |status| patient.bacteriological_status == status)
            && self.card.map_or(true, |card| card.matches(patient))
    }

    fn matches_search(&self, patient: &Patient) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let haystack = format!(
            "{} {} {} {}",
            patient.last_name, patient.first_name, patient.id, patient.hospital_number
        )
        .to_lowercase();
        haystack.contains(&self.search.to_lowercase())
    }
}

pub fn filter_patients<'a>(patients: &'a [Patient], query: &RegistryQuery) -> Vec<&'a Patient> {
    patients
        .iter()
        .filter(|patient| query.matches(patient))
        .collect()
}

/// Một dòng của bảng danh sách ca, kèm các giá trị đã suy diễn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseRow {
    pub patient: Patient,
    pub active: bool,
    pub missing: Vec<MissingField>,
    pub latest_xpert: DiagnosticRecord,
    pub latest_smear: DiagnosticRecord,
}

impl CaseRow {
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            patient: patient.clone(),
            active: is_active(patient),
            missing: missing_fields(patient),
            latest_xpert: resolve_latest(&patient.xpert_history),
            latest_smear: resolve_latest(&patient.smear_history),
        }
    }
}

pub fn case_rows(patients: &[Patient], query: &RegistryQuery) -> Vec<CaseRow> {
    filter_patients(patients, query)
        .into_iter()
        .map(CaseRow::from_patient)
        .collect()
}

//! Chuẩn bị hồ sơ trước khi gửi lên kho dữ liệu.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Disposition, Patient, RecordStatus, RegistryError};

/// Cập nhật một phần: chỉ kết cục cuối và ngày kết cục.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DispositionUpdate {
    #[serde(with = "crate::blank_disposition", default)]
    pub final_disposition: Option<Disposition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_disposition_date: Option<String>,
}

impl DispositionUpdate {
    pub fn new(final_disposition: Option<Disposition>, date: Option<String>) -> Self {
        Self {
            final_disposition,
            final_disposition_date: date.filter(|d| !d.trim().is_empty()),
        }
    }

    /// Ngày không được gửi thì giữ nguyên giá trị cũ.
    pub fn apply_to(&self, patient: &mut Patient) {
        patient.final_disposition = self.final_disposition;
        if let Some(date) = &self.final_disposition_date {
            patient.final_disposition_date = Some(date.clone());
        }
    }
}

/// Kiểm tra và bổ sung hồ sơ cho thao tác lưu (tạo mới hoặc ghi đè).
///
/// Hồ sơ chưa có `id` được cấp mã mới, `createdAt` và trạng thái `Active`.
/// Ca đã ra viện/tử vong/chuyển viện ngay từ đầu bắt buộc có ngày kết cục;
/// kết cục cuối còn trống được điền từ vị trí ban đầu.
pub fn prepare_for_save(
    mut patient: Patient,
    now: DateTime<Utc>,
) -> Result<Patient, RegistryError> {
    if let Some(initial) = patient.initial_disposition {
        if let Some(outcome) = concluded_outcome(initial) {
            let has_date = patient
                .final_disposition_date
                .as_deref()
                .is_some_and(|date| !date.trim().is_empty());
            if !has_date {
                return Err(RegistryError::MissingDispositionDate(initial.label()));
            }
            if patient.final_disposition.is_none() {
                patient.final_disposition = Some(outcome);
            }
        }
    }

    if patient.id.trim().is_empty() {
        patient.id = new_patient_id();
        patient.created_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        patient.status = RecordStatus::Active;
    }

    Ok(patient)
}

fn concluded_outcome(initial: Disposition) -> Option<Disposition> {
    match initial {
        Disposition::Discharged => Some(Disposition::Discharged),
        Disposition::Expired => Some(Disposition::Expired),
        Disposition::Transferred => Some(Disposition::TransferredOut),
        _ => None,
    }
}

fn new_patient_id() -> String {
    Uuid::new_v4().simple().to_string()
}

//! Mô hình dữ liệu và engine suy diễn trạng thái cho sổ đăng ký ca lao phổi (PTB).

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod completeness;
pub mod filter;
pub mod latest;
pub mod registration;
pub mod stats;
pub mod status;

pub use completeness::{is_complete, missing_fields, missing_labels, MissingField};
pub use filter::{case_rows, filter_patients, CardFilter, CaseRow, OutcomeFilter, RegistryQuery};
pub use latest::{latest_result, resolve_latest};
pub use registration::{prepare_for_save, DispositionUpdate};
pub use stats::{aggregate, age_on};
pub use status::{effective_status, is_active};

/// Cấu hình cache và biểu đồ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegistryConfig {
    /// Thời gian sống (giây) của bản cache danh sách bệnh nhân.
    pub cache_ttl_secs: u64,
    /// Tên slot lưu envelope cache.
    pub cache_key: String,
    /// Số khoa/phòng hiển thị trong bảng xếp hạng.
    pub top_wards: usize,
    /// Độ lệch giờ địa phương của bệnh viện so với UTC, tính bằng phút.
    pub utc_offset_minutes: i32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 5 * 60,
            cache_key: "ptb_registry_cache".to_string(),
            top_wards: 8,
            utc_offset_minutes: 8 * 60,
        }
    }
}

impl RegistryConfig {
    /// TTL vượt quá khoảng biểu diễn được của `Duration` được giữ ở `Duration::MAX`.
    pub fn cache_ttl(&self) -> Duration {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Múi giờ dùng để quy timestamp về ngày lịch. Độ lệch không hợp lệ (ngoài ±24h)
    /// được coi là UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Ngày hôm nay theo giờ địa phương của bệnh viện.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset()).date_naive()
    }
}

/// Kết quả một lần xét nghiệm (Xpert hoặc nhuộm soi đờm).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum LabResult {
    #[default]
    Pending,
    Positive,
    Negative,
    #[serde(rename = "Not Done")]
    NotDone,
    Trace,
    Indeterminate,
}

impl LabResult {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Pending" => Some(Self::Pending),
            "Positive" => Some(Self::Positive),
            "Negative" => Some(Self::Negative),
            "Not Done" => Some(Self::NotDone),
            "Trace" => Some(Self::Trace),
            "Indeterminate" => Some(Self::Indeterminate),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::NotDone => "Not Done",
            Self::Trace => "Trace",
            Self::Indeterminate => "Indeterminate",
        }
    }
}

/// Vị trí/kết cục của bệnh nhân.
///
/// Gộp cả giá trị ban đầu (ER-level, Admitted, Discharged, Expired, Transferred, HAMA)
/// và kết cục cuối (thêm Transferred out, Lost to follow-up).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Disposition {
    #[serde(rename = "ER-level")]
    ErLevel,
    Admitted,
    Discharged,
    Expired,
    Transferred,
    #[serde(rename = "Transferred out")]
    TransferredOut,
    #[serde(rename = "Lost to follow-up")]
    LostToFollowUp,
    #[serde(rename = "HAMA")]
    Hama,
}

impl Disposition {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "ER-level" => Some(Self::ErLevel),
            "Admitted" => Some(Self::Admitted),
            "Discharged" => Some(Self::Discharged),
            "Expired" => Some(Self::Expired),
            "Transferred" => Some(Self::Transferred),
            "Transferred out" => Some(Self::TransferredOut),
            "Lost to follow-up" => Some(Self::LostToFollowUp),
            "HAMA" => Some(Self::Hama),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ErLevel => "ER-level",
            Self::Admitted => "Admitted",
            Self::Discharged => "Discharged",
            Self::Expired => "Expired",
            Self::Transferred => "Transferred",
            Self::TransferredOut => "Transferred out",
            Self::LostToFollowUp => "Lost to follow-up",
            Self::Hama => "HAMA",
        }
    }

    /// Ca đang điều trị: nhập viện hoặc đang ở mức cấp cứu.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Admitted | Self::ErLevel)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum BacteriologicalStatus {
    Bacteriological,
    Clinical,
    #[default]
    Pending,
}

impl BacteriologicalStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Bacteriological" => Some(Self::Bacteriological),
            "Clinical" => Some(Self::Clinical),
            "Pending" => Some(Self::Pending),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bacteriological => "Bacteriological",
            Self::Clinical => "Clinical",
            Self::Pending => "Pending",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum DrugSusceptibility {
    #[serde(rename = "Drug-susceptible")]
    Susceptible,
    #[serde(rename = "Drug Resistant")]
    Resistant,
    #[default]
    Unknown,
}

impl DrugSusceptibility {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Drug-susceptible" => Some(Self::Susceptible),
            "Drug Resistant" => Some(Self::Resistant),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum HivStatus {
    Positive,
    Negative,
    #[default]
    Unknown,
    Pending,
}

impl HivStatus {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Positive" => Some(Self::Positive),
            "Negative" => Some(Self::Negative),
            "Unknown" => Some(Self::Unknown),
            "Pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

/// Trạng thái lưu trữ của hồ sơ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RecordStatus {
    #[default]
    Active,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Comorbidities {
    pub diabetes: bool,
    pub substance_abuse: bool,
    pub liver_disease: bool,
    pub renal_disease: bool,
    /// Danh sách bệnh kèm khác, phân tách bằng dấu phẩy.
    pub others: String,
}

/// Một lần xét nghiệm có ngày. `date` rỗng nghĩa là chưa thực hiện.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DiagnosticRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: String,
    pub result: LabResult,
}

impl DiagnosticRecord {
    pub fn new(date: impl Into<String>, result: LabResult) -> Self {
        Self {
            id: None,
            date: date.into(),
            result,
        }
    }

    /// Bản ghi tổng hợp khi chưa có lịch sử.
    pub fn pending() -> Self {
        Self::new("", LabResult::Pending)
    }
}

/// Một ca bệnh trong sổ đăng ký.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Patient {
    pub id: String,
    pub hospital_number: String,
    pub last_name: String,
    pub first_name: String,
    pub dob: String,
    pub sex: String,
    pub civil_status: String,
    pub brgy: String,
    pub city: String,

    pub date_of_admission: String,
    pub area_ward: String,
    pub doctor_in_charge: String,
    #[serde(with = "blank_disposition")]
    pub initial_disposition: Option<Disposition>,

    pub xpert_history: Vec<DiagnosticRecord>,
    pub smear_history: Vec<DiagnosticRecord>,

    pub bacteriological_status: BacteriologicalStatus,
    pub anatomical_site: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_pulmonary_site: Option<String>,
    pub drug_susceptibility: DrugSusceptibility,
    pub treatment_history: String,

    pub treatment_started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_regimen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_regimen_notes: Option<String>,

    pub comorbidities: Comorbidities,
    pub hiv_test_result: HivStatus,
    pub started_on_art: bool,

    /// `None` tương ứng ô trống trên bảng tính.
    #[serde(with = "blank_disposition")]
    pub final_disposition: Option<Disposition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_disposition_date: Option<String>,

    pub status: RecordStatus,
    pub created_at: String,
}

/// Bộ đếm cho các thẻ tổng quan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_active: usize,
    pub admitted: usize,
    pub er_level: usize,
    pub discharged_this_month: usize,
    pub expired_this_month: usize,
    pub pending_labs: usize,
    pub inactive_missing: usize,
}

/// Số ca nhập viện trong một tháng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CensusPoint {
    /// Khóa `YYYY-MM`.
    pub raw_date: String,
    /// Nhãn dạng `Jan 24`.
    pub name: String,
    pub patients: usize,
}

/// Một lát của biểu đồ tròn/cột.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartSlice {
    pub name: String,
    pub value: usize,
}

impl ChartSlice {
    pub fn new(name: impl Into<String>, value: usize) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Một hàng của biểu đồ hiệu suất chẩn đoán.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct YieldRow {
    pub name: String,
    pub xpert: usize,
    pub smear: usize,
}

/// Toàn bộ số liệu cho màn hình tổng quan và phân tích.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryOverview {
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub stats: DashboardStats,
    pub census: Vec<CensusPoint>,
    pub outcomes: Vec<ChartSlice>,
    pub classifications: Vec<ChartSlice>,
    pub diagnostic_yield: Vec<YieldRow>,
    pub wards: Vec<ChartSlice>,
    pub age_bands: Vec<ChartSlice>,
}

/// Lỗi chung của sổ đăng ký.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu: {0}")]
    MissingData(String),
    #[error("Cần ngày ra viện/chuyển viện cho kết cục {0}")]
    MissingDispositionDate(&'static str),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Lỗi kết nối kho dữ liệu: {0}")]
    Transport(String),
    #[error("Kho dữ liệu trả về trạng thái {0}")]
    RemoteStatus(String),
    #[error("Lỗi lưu cache: {0}")]
    Storage(String),
}

/// Đọc ngày dạng `YYYY-MM-DD`, hoặc timestamp RFC 3339 quy về ngày lịch tại `offset`.
///
/// Bảng tính gửi nửa đêm giờ địa phương dưới dạng thời điểm UTC
/// (`2024-01-31T16:00:00.000Z` là ngày 1/2 ở UTC+8).
pub fn parse_calendar_date(value: &str, offset: FixedOffset) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .map(|dt| dt.with_timezone(&offset).date_naive())
                .ok()
        })
}

/// Ô kết cục trống trên bảng tính được đọc/ghi như `None`.
pub(crate) mod blank_disposition {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::Disposition;

    pub fn serialize<S: Serializer>(
        value: &Option<Disposition>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(disposition) => disposition.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Disposition>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(Disposition::from_label))
    }
}

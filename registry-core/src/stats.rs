//! Bộ đếm thẻ tổng quan và dữ liệu biểu đồ, tính lại toàn bộ ở mỗi lần gọi.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, FixedOffset, NaiveDate, Utc};

use crate::filter::CardFilter;
use crate::latest::latest_result;
use crate::status::effective_status;
use crate::{
    parse_calendar_date, BacteriologicalStatus, CensusPoint, ChartSlice, DashboardStats,
    Disposition, LabResult, Patient, RegistryConfig, RegistryOverview, YieldRow,
};

/// Nhãn cho khoa/phòng bỏ trống.
pub const UNKNOWN_WARD: &str = "Unknown";

/// Tính các bộ đếm; `today` quyết định tháng hiện tại, `offset` quy timestamp về ngày.
pub fn aggregate(patients: &[Patient], today: NaiveDate, offset: FixedOffset) -> DashboardStats {
    let count = |card: CardFilter| patients.iter().filter(|p| card.matches(p)).count();

    DashboardStats {
        total_active: count(CardFilter::TotalActive),
        admitted: count(CardFilter::Admitted),
        er_level: count(CardFilter::ErLevel),
        discharged_this_month: concluded_in_month(patients, Disposition::Discharged, today, offset),
        expired_this_month: concluded_in_month(patients, Disposition::Expired, today, offset),
        pending_labs: count(CardFilter::PendingLabs),
        inactive_missing: count(CardFilter::InactiveMissing),
    }
}

fn concluded_in_month(
    patients: &[Patient],
    outcome: Disposition,
    today: NaiveDate,
    offset: FixedOffset,
) -> usize {
    patients
        .iter()
        .filter(|p| p.final_disposition == Some(outcome))
        .filter_map(|p| {
            p.final_disposition_date
                .as_deref()
                .and_then(|date| parse_calendar_date(date, offset))
        })
        .filter(|date| date.year() == today.year() && date.month() == today.month())
        .count()
}

/// Số ca nhập viện theo tháng, tăng dần theo thời gian.
pub fn monthly_census(patients: &[Patient], offset: FixedOffset) -> Vec<CensusPoint> {
    let mut counts: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for date in patients
        .iter()
        .filter_map(|p| parse_calendar_date(&p.date_of_admission, offset))
    {
        *counts.entry((date.year(), date.month())).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((year, month), patients)| CensusPoint {
            raw_date: format!("{year}-{month:02}"),
            name: NaiveDate::from_ymd_opt(year, month, 1)
                .map(|first| first.format("%b %y").to_string())
                .unwrap_or_default(),
            patients,
        })
        .collect()
}

/// Nhóm kết cục cho biểu đồ tròn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeBucket {
    ActiveAdmitted,
    ActiveEr,
    Discharged,
    Expired,
    Transferred,
    Others,
}

impl OutcomeBucket {
    const ORDER: [OutcomeBucket; 6] = [
        Self::ActiveAdmitted,
        Self::ActiveEr,
        Self::Discharged,
        Self::Expired,
        Self::Transferred,
        Self::Others,
    ];

    pub fn of(patient: &Patient) -> Self {
        match effective_status(patient) {
            Some(Disposition::Admitted) => Self::ActiveAdmitted,
            Some(Disposition::ErLevel) => Self::ActiveEr,
            Some(Disposition::Discharged) => Self::Discharged,
            Some(Disposition::Expired) => Self::Expired,
            Some(Disposition::TransferredOut | Disposition::Transferred) => Self::Transferred,
            _ => Self::Others,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ActiveAdmitted => "Active (Admitted)",
            Self::ActiveEr => "Active (ER)",
            Self::Discharged => "Discharged",
            Self::Expired => "Expired",
            Self::Transferred => "Transferred",
            Self::Others => "Others",
        }
    }
}

/// Cơ cấu kết cục, bỏ các nhóm bằng 0.
pub fn outcome_mix(patients: &[Patient]) -> Vec<ChartSlice> {
    OutcomeBucket::ORDER
        .iter()
        .map(|bucket| {
            let value = patients
                .iter()
                .filter(|p| OutcomeBucket::of(p) == *bucket)
                .count();
            ChartSlice::new(bucket.label(), value)
        })
        .filter(|slice| slice.value > 0)
        .collect()
}

/// Cơ cấu phân loại vi khuẩn học / lâm sàng, bỏ các nhóm bằng 0.
pub fn classification_mix(patients: &[Patient]) -> Vec<ChartSlice> {
    [
        BacteriologicalStatus::Bacteriological,
        BacteriologicalStatus::Clinical,
        BacteriologicalStatus::Pending,
    ]
    .into_iter()
    .map(|status| {
        let value = patients
            .iter()
            .filter(|p| p.bacteriological_status == status)
            .count();
        ChartSlice::new(status.label(), value)
    })
    .filter(|slice| slice.value > 0)
    .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum YieldBucket {
    Positive,
    Negative,
    PendingOther,
}

fn xpert_bucket(result: LabResult) -> YieldBucket {
    match result {
        LabResult::Positive | LabResult::Trace => YieldBucket::Positive,
        LabResult::Negative => YieldBucket::Negative,
        _ => YieldBucket::PendingOther,
    }
}

// Smear has no trace grade.
fn smear_bucket(result: LabResult) -> YieldBucket {
    match result {
        LabResult::Positive => YieldBucket::Positive,
        LabResult::Negative => YieldBucket::Negative,
        _ => YieldBucket::PendingOther,
    }
}

/// Hiệu suất chẩn đoán theo kết quả mới nhất của Xpert và nhuộm soi.
pub fn diagnostic_yield(patients: &[Patient]) -> Vec<YieldRow> {
    let rows = [
        ("Positive", YieldBucket::Positive),
        ("Negative", YieldBucket::Negative),
        ("Pending/Other", YieldBucket::PendingOther),
    ];

    rows.into_iter()
        .map(|(name, bucket)| YieldRow {
            name: name.to_string(),
            xpert: patients
                .iter()
                .filter(|p| xpert_bucket(latest_result(&p.xpert_history)) == bucket)
                .count(),
            smear: patients
                .iter()
                .filter(|p| smear_bucket(latest_result(&p.smear_history)) == bucket)
                .count(),
        })
        .collect()
}

/// Các khoa/phòng đông nhất; hòa nhau giữ thứ tự xuất hiện đầu tiên.
pub fn ward_ranking(patients: &[Patient], top_n: usize) -> Vec<ChartSlice> {
    let mut slices: Vec<ChartSlice> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for patient in patients {
        let ward = if patient.area_ward.trim().is_empty() {
            UNKNOWN_WARD
        } else {
            patient.area_ward.as_str()
        };
        match index.get(ward) {
            Some(&position) => slices[position].value += 1,
            None => {
                index.insert(ward, slices.len());
                slices.push(ChartSlice::new(ward, 1));
            }
        }
    }

    slices.sort_by(|a, b| b.value.cmp(&a.value));
    slices.truncate(top_n);
    slices
}

/// Tuổi tròn tại ngày `today`, có hiệu chỉnh theo tháng/ngày sinh.
pub fn age_on(dob: &str, today: NaiveDate, offset: FixedOffset) -> Option<i32> {
    let birth_date = parse_calendar_date(dob, offset)?;
    let mut age = today.year() - birth_date.year();

    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }

    if age >= 0 {
        Some(age)
    } else {
        None
    }
}

/// Phân bố nhóm tuổi; luôn trả đủ bốn nhóm.
pub fn age_bands(patients: &[Patient], today: NaiveDate, offset: FixedOffset) -> Vec<ChartSlice> {
    let mut bands = [
        ChartSlice::new("0-18", 0),
        ChartSlice::new("19-39", 0),
        ChartSlice::new("40-59", 0),
        ChartSlice::new("60+", 0),
    ];

    for age in patients.iter().filter_map(|p| age_on(&p.dob, today, offset)) {
        let slot = match age {
            a if a < 19 => 0,
            a if a < 40 => 1,
            a if a < 60 => 2,
            _ => 3,
        };
        bands[slot].value += 1;
    }

    bands.into()
}

impl RegistryOverview {
    /// Tính toàn bộ số liệu tổng quan cho một lần hiển thị.
    pub fn build(patients: &[Patient], today: NaiveDate, config: &RegistryConfig) -> Self {
        let offset = config.utc_offset();
        Self {
            generated_at: Utc::now(),
            total_records: patients.len(),
            stats: aggregate(patients, today, offset),
            census: monthly_census(patients, offset),
            outcomes: outcome_mix(patients),
            classifications: classification_mix(patients),
            diagnostic_yield: diagnostic_yield(patients),
            wards: ward_ranking(patients, config.top_wards),
            age_bands: age_bands(patients, today, offset),
        }
    }
}

//! Chọn kết quả "hiện hành" từ lịch sử xét nghiệm không theo thứ tự ngày.

use std::cmp::Reverse;

use chrono::{NaiveDate, Offset, Utc};

use crate::{parse_calendar_date, DiagnosticRecord, LabResult};

/// Trả về bản ghi mới nhất theo ngày.
///
/// Lịch sử rỗng cho ra bản ghi `{date: "", result: Pending}`. Bản ghi không có ngày
/// (hoặc ngày không đọc được) luôn xếp sau mọi bản ghi có ngày. Khi trùng ngày,
/// bản ghi được nhập trước thắng.
pub fn resolve_latest(history: &[DiagnosticRecord]) -> DiagnosticRecord {
    history
        .iter()
        .min_by_key(|record| Reverse(record_date(record)))
        .cloned()
        .unwrap_or_else(DiagnosticRecord::pending)
}

/// Chỉ lấy kết quả của bản ghi hiện hành.
pub fn latest_result(history: &[DiagnosticRecord]) -> LabResult {
    history
        .iter()
        .min_by_key(|record| Reverse(record_date(record)))
        .map(|record| record.result)
        .unwrap_or(LabResult::Pending)
}

pub(crate) fn is_pending(history: &[DiagnosticRecord]) -> bool {
    latest_result(history) == LabResult::Pending
}

// Chỉ dùng để so thứ tự: mọi timestamp trong một lịch sử cùng độ lệch giờ,
// nên quy về UTC không đổi thứ tự giữa chúng.
fn record_date(record: &DiagnosticRecord) -> Option<NaiveDate> {
    parse_calendar_date(&record.date, Utc.fix())
}

//! Phân loại ca đang điều trị / đã kết thúc.

use crate::{Disposition, Patient};

/// Kết cục cuối nếu đã ghi, ngược lại là vị trí ban đầu.
///
/// Mọi phép suy diễn về trạng thái đều đi qua hàm này.
pub fn effective_status(patient: &Patient) -> Option<Disposition> {
    patient.final_disposition.or(patient.initial_disposition)
}

pub fn is_active(patient: &Patient) -> bool {
    effective_status(patient).is_some_and(Disposition::is_active)
}

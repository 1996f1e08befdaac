use registry_core::{latest_result, resolve_latest, DiagnosticRecord, LabResult};

fn record(date: &str, result: LabResult) -> DiagnosticRecord {
    DiagnosticRecord::new(date, result)
}

#[test]
fn empty_history_resolves_to_synthetic_pending() {
    let latest = resolve_latest(&[]);
    assert_eq!(latest, DiagnosticRecord::new("", LabResult::Pending));
    assert_eq!(latest_result(&[]), LabResult::Pending);
}

#[test]
fn newest_record_wins_regardless_of_input_order() {
    let history = vec![
        record("2024-01-10", LabResult::Negative),
        record("2024-03-02", LabResult::Positive),
        record("2023-12-25", LabResult::Trace),
    ];

    let orders: [[usize; 3]; 6] = [
        [0, 1, 2],
        [0, 2, 1],
        [1, 0, 2],
        [1, 2, 0],
        [2, 0, 1],
        [2, 1, 0],
    ];

    for order in orders {
        let permuted: Vec<_> = order.iter().map(|&i| history[i].clone()).collect();
        let latest = resolve_latest(&permuted);
        assert_eq!(latest.date, "2024-03-02", "thứ tự {order:?}");
        assert_eq!(latest.result, LabResult::Positive);
    }
}

#[test]
fn undated_entry_never_beats_a_dated_one() {
    let history = vec![
        record("", LabResult::Positive),
        record("1999-01-01", LabResult::Negative),
        record("", LabResult::Trace),
    ];

    let latest = resolve_latest(&history);
    assert_eq!(latest.date, "1999-01-01");
    assert_eq!(latest.result, LabResult::Negative);
}

#[test]
fn only_undated_entries_pick_the_first_inserted() {
    let history = vec![
        record("", LabResult::NotDone),
        record("", LabResult::Positive),
    ];

    assert_eq!(resolve_latest(&history).result, LabResult::NotDone);
}

#[test]
fn same_date_tie_keeps_insertion_order_and_is_repeatable() {
    let history = vec![
        record("2024-05-01", LabResult::Indeterminate),
        record("2024-05-01", LabResult::Positive),
        record("2024-04-01", LabResult::Negative),
    ];

    let first = resolve_latest(&history);
    let second = resolve_latest(&history);
    assert_eq!(first, second);
    assert_eq!(first.result, LabResult::Indeterminate);
}

#[test]
fn timestamp_dates_from_the_spreadsheet_are_ordered_by_calendar_day() {
    let history = vec![
        record("2024-02-01T16:00:00.000Z", LabResult::Negative),
        record("2024-02-03", LabResult::Positive),
    ];

    assert_eq!(resolve_latest(&history).result, LabResult::Positive);
}

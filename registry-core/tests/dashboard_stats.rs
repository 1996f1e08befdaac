use chrono::{FixedOffset, NaiveDate};
use registry_core::stats::{
    age_bands, classification_mix, diagnostic_yield, monthly_census, outcome_mix, ward_ranking,
};
use registry_core::{
    age_on, aggregate, BacteriologicalStatus, ChartSlice, DashboardStats, DiagnosticRecord,
    Disposition, LabResult, Patient, RegistryConfig, RegistryOverview,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("ngày hợp lệ")
}

fn site_offset() -> FixedOffset {
    RegistryConfig::default().utc_offset()
}

fn with_outcome(final_disposition: Disposition, date: &str) -> Patient {
    Patient {
        initial_disposition: Some(Disposition::Admitted),
        final_disposition: Some(final_disposition),
        final_disposition_date: Some(date.to_string()),
        ..Patient::default()
    }
}

fn in_ward(ward: &str) -> Patient {
    Patient {
        area_ward: ward.to_string(),
        ..Patient::default()
    }
}

#[test]
fn empty_roster_is_all_zero() {
    assert_eq!(aggregate(&[], date(2024, 3, 15), site_offset()), DashboardStats::default());
}

#[test]
fn active_counters_split_by_effective_status() {
    let patients = vec![
        Patient {
            initial_disposition: Some(Disposition::Admitted),
            ..Patient::default()
        },
        Patient {
            initial_disposition: Some(Disposition::ErLevel),
            ..Patient::default()
        },
        Patient {
            initial_disposition: Some(Disposition::ErLevel),
            final_disposition: Some(Disposition::Admitted),
            ..Patient::default()
        },
        Patient {
            initial_disposition: Some(Disposition::Hama),
            ..Patient::default()
        },
    ];

    let stats = aggregate(&patients, date(2024, 3, 15), site_offset());
    assert_eq!(stats.total_active, 3);
    assert_eq!(stats.admitted, 2);
    assert_eq!(stats.er_level, 1);
    assert_eq!(stats.pending_labs, 3);
    assert_eq!(stats.inactive_missing, 1);
}

#[test]
fn this_month_counts_use_the_evaluation_month() {
    let patients = vec![
        with_outcome(Disposition::Discharged, "2024-03-01"),
        with_outcome(Disposition::Discharged, "2024-03-31"),
        with_outcome(Disposition::Discharged, "2024-02-29"),
        with_outcome(Disposition::Discharged, "2023-03-10"),
        with_outcome(Disposition::Expired, "2024-03-05T08:00:00.000Z"),
        with_outcome(Disposition::Expired, ""),
        Patient {
            initial_disposition: Some(Disposition::Expired),
            final_disposition_date: Some("2024-03-05".to_string()),
            ..Patient::default()
        },
    ];

    let stats = aggregate(&patients, date(2024, 3, 15), site_offset());
    assert_eq!(stats.discharged_this_month, 2);
    assert_eq!(stats.expired_this_month, 1);
}

#[test]
fn spreadsheet_midnight_timestamps_count_in_the_local_month() {
    let patients = vec![
        with_outcome(Disposition::Discharged, "2024-02-29T16:00:00.000Z"),
        with_outcome(Disposition::Expired, "2024-03-31T16:00:00.000Z"),
    ];

    let stats = aggregate(&patients, date(2024, 3, 15), site_offset());
    assert_eq!(stats.discharged_this_month, 1);
    assert_eq!(stats.expired_this_month, 0);

    let utc = FixedOffset::east_opt(0).expect("độ lệch hợp lệ");
    let stats = aggregate(&patients, date(2024, 3, 15), utc);
    assert_eq!(stats.discharged_this_month, 0);
    assert_eq!(stats.expired_this_month, 1);
}

#[test]
fn census_buckets_spreadsheet_timestamps_by_local_date() {
    let patients = vec![
        Patient {
            date_of_admission: "2024-01-31T16:00:00.000Z".to_string(),
            ..Patient::default()
        },
        Patient {
            date_of_admission: "2024-01-31T15:59:59.000Z".to_string(),
            ..Patient::default()
        },
    ];

    let census = monthly_census(&patients, site_offset());
    let keys: Vec<_> = census.iter().map(|p| (p.raw_date.as_str(), p.patients)).collect();
    assert_eq!(keys, vec![("2024-01", 1), ("2024-02", 1)]);
}

#[test]
fn birth_date_timestamp_uses_local_calendar_day() {
    let today = date(2024, 3, 15);
    assert_eq!(age_on("2000-03-14T16:00:00.000Z", today, site_offset()), Some(24));
    assert_eq!(age_on("2000-03-15T16:00:00.000Z", today, site_offset()), Some(23));
}

#[test]
fn census_is_grouped_by_month_in_chronological_order() {
    let admitted = |day: &str| Patient {
        date_of_admission: day.to_string(),
        ..Patient::default()
    };
    let patients = vec![
        admitted("2024-02-11"),
        admitted("2023-12-30"),
        admitted("2024-02-01"),
        admitted(""),
        admitted("2024-01-05"),
    ];

    let census = monthly_census(&patients, site_offset());
    let keys: Vec<_> = census.iter().map(|p| p.raw_date.as_str()).collect();
    assert_eq!(keys, vec!["2023-12", "2024-01", "2024-02"]);
    assert_eq!(census[2].patients, 2);
    assert_eq!(census[0].name, "Dec 23");
}

#[test]
fn outcome_mix_keeps_fixed_order_and_drops_empty_buckets() {
    let patients = vec![
        with_outcome(Disposition::Expired, "2024-01-01"),
        Patient {
            initial_disposition: Some(Disposition::Admitted),
            ..Patient::default()
        },
        with_outcome(Disposition::TransferredOut, "2024-01-01"),
        with_outcome(Disposition::LostToFollowUp, "2024-01-01"),
        Patient::default(),
    ];

    assert_eq!(
        outcome_mix(&patients),
        vec![
            ChartSlice::new("Active (Admitted)", 1),
            ChartSlice::new("Expired", 1),
            ChartSlice::new("Transferred", 1),
            ChartSlice::new("Others", 2),
        ]
    );
}

#[test]
fn classification_mix_drops_empty_buckets() {
    let patients = vec![
        Patient {
            bacteriological_status: BacteriologicalStatus::Clinical,
            ..Patient::default()
        },
        Patient {
            bacteriological_status: BacteriologicalStatus::Clinical,
            ..Patient::default()
        },
        Patient::default(),
    ];

    assert_eq!(
        classification_mix(&patients),
        vec![ChartSlice::new("Clinical", 2), ChartSlice::new("Pending", 1)]
    );
}

#[test]
fn xpert_trace_counts_as_positive_but_smear_has_no_trace() {
    let patients = vec![Patient {
        xpert_history: vec![DiagnosticRecord::new("2024-01-01", LabResult::Trace)],
        smear_history: vec![DiagnosticRecord::new("2024-01-01", LabResult::Trace)],
        ..Patient::default()
    }];

    let rows = diagnostic_yield(&patients);
    let names: Vec<_> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["Positive", "Negative", "Pending/Other"]);
    assert_eq!((rows[0].xpert, rows[0].smear), (1, 0));
    assert_eq!((rows[2].xpert, rows[2].smear), (0, 1));
}

#[test]
fn ward_ranking_sorts_descending_and_truncates() {
    let patients = vec![
        in_ward("ICU"),
        in_ward("SARI 1"),
        in_ward(""),
        in_ward("SARI 1"),
        in_ward("Surgery Ward"),
        in_ward(""),
        in_ward("SARI 1"),
    ];

    assert_eq!(
        ward_ranking(&patients, 3),
        vec![
            ChartSlice::new("SARI 1", 3),
            ChartSlice::new("Unknown", 2),
            ChartSlice::new("ICU", 1),
        ]
    );
}

#[test]
fn age_applies_birthday_correction() {
    let today = date(2024, 3, 15);
    assert_eq!(age_on("2000-03-15", today, site_offset()), Some(24));
    assert_eq!(age_on("2000-03-16", today, site_offset()), Some(23));
    assert_eq!(age_on("2024-12-01", today, site_offset()), None);
    assert_eq!(age_on("", today, site_offset()), None);
}

#[test]
fn age_bands_always_report_four_buckets() {
    let born = |dob: &str| Patient {
        dob: dob.to_string(),
        ..Patient::default()
    };
    let patients = vec![
        born("2006-03-16"),
        born("2005-03-15"),
        born("1984-06-01"),
        born("1964-03-15"),
        born(""),
    ];

    assert_eq!(
        age_bands(&patients, date(2024, 3, 15), site_offset()),
        vec![
            ChartSlice::new("0-18", 1),
            ChartSlice::new("19-39", 2),
            ChartSlice::new("40-59", 0),
            ChartSlice::new("60+", 1),
        ]
    );
}

#[test]
fn overview_bundles_every_reduction() {
    let patients: Vec<_> = (0..10).map(|i| in_ward(&format!("Ward {i}"))).collect();
    let overview = RegistryOverview::build(&patients, date(2024, 3, 15), &RegistryConfig::default());

    assert_eq!(overview.total_records, 10);
    assert_eq!(overview.wards.len(), 8);
    assert_eq!(overview.age_bands.len(), 4);
    assert_eq!(overview.diagnostic_yield[2].xpert, 10);
}

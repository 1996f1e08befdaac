use registry_core::{
    effective_status, is_active, is_complete, missing_fields, missing_labels,
    BacteriologicalStatus, DiagnosticRecord, Disposition, DrugSusceptibility, HivStatus,
    LabResult, MissingField, Patient,
};

/// Ca đã đủ mọi thông tin, dùng làm nền cho từng trường hợp.
fn complete_patient() -> Patient {
    Patient {
        id: "p-1".to_string(),
        initial_disposition: Some(Disposition::Admitted),
        xpert_history: vec![DiagnosticRecord::new("2024-01-10", LabResult::Positive)],
        smear_history: vec![DiagnosticRecord::new("2024-01-11", LabResult::Negative)],
        hiv_test_result: HivStatus::Negative,
        drug_susceptibility: DrugSusceptibility::Susceptible,
        bacteriological_status: BacteriologicalStatus::Bacteriological,
        ..Patient::default()
    }
}

#[test]
fn final_disposition_overrides_initial_placement() {
    let mut patient = complete_patient();
    patient.final_disposition = Some(Disposition::Discharged);

    assert_eq!(effective_status(&patient), Some(Disposition::Discharged));
    assert!(!is_active(&patient));
}

#[test]
fn empty_final_disposition_falls_back_to_initial() {
    let mut patient = complete_patient();
    patient.initial_disposition = Some(Disposition::ErLevel);
    patient.final_disposition = None;

    assert_eq!(effective_status(&patient), Some(Disposition::ErLevel));
    assert!(is_active(&patient));
}

#[test]
fn only_admitted_and_er_level_are_active() {
    let cases = [
        (Some(Disposition::Admitted), true),
        (Some(Disposition::ErLevel), true),
        (Some(Disposition::Discharged), false),
        (Some(Disposition::Expired), false),
        (Some(Disposition::Transferred), false),
        (Some(Disposition::TransferredOut), false),
        (Some(Disposition::LostToFollowUp), false),
        (Some(Disposition::Hama), false),
        (None, false),
    ];

    for (disposition, expected) in cases {
        let patient = Patient {
            initial_disposition: disposition,
            ..Patient::default()
        };
        assert_eq!(is_active(&patient), expected, "{disposition:?}");
    }
}

#[test]
fn complete_patient_has_no_missing_fields() {
    let patient = complete_patient();
    assert!(missing_fields(&patient).is_empty());
    assert!(is_complete(&patient));
}

#[test]
fn discharged_without_outcome_only_misses_final_disposition() {
    let mut patient = complete_patient();
    patient.initial_disposition = Some(Disposition::Discharged);
    patient.final_disposition = None;

    assert_eq!(missing_labels(&patient), vec!["Final Disposition"]);
}

#[test]
fn missing_fields_follow_display_order() {
    let patient = Patient {
        initial_disposition: Some(Disposition::Expired),
        hiv_test_result: HivStatus::Pending,
        ..Patient::default()
    };

    assert_eq!(
        missing_fields(&patient),
        vec![
            MissingField::XpertResult,
            MissingField::SmearResult,
            MissingField::HivStatus,
            MissingField::DrugSusceptibility,
            MissingField::FinalDisposition,
            MissingField::Classification,
        ]
    );
}

#[test]
fn transferred_placement_does_not_demand_an_outcome() {
    let mut patient = complete_patient();
    patient.initial_disposition = Some(Disposition::Transferred);
    patient.final_disposition = None;

    assert!(is_complete(&patient));
}

#[test]
fn latest_pending_result_counts_as_missing_even_with_older_results() {
    let mut patient = complete_patient();
    patient
        .smear_history
        .push(DiagnosticRecord::new("2024-02-01", LabResult::Pending));

    assert_eq!(missing_fields(&patient), vec![MissingField::SmearResult]);
}

#[test]
fn admitted_patient_without_smear_misses_only_smear() {
    let mut patient = complete_patient();
    patient.smear_history.clear();

    assert!(is_active(&patient));
    assert_eq!(missing_labels(&patient), vec!["Smear Result"]);
}

#[test]
fn missing_field_serializes_as_display_label() {
    let json = serde_json::to_string(&[MissingField::DrugSusceptibility]).expect("serialize");
    assert_eq!(json, r#"["Drug Susc."]"#);
}

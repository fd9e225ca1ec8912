//! # Test-Data Transformer
//!
//! Converts the raw billing payload into the grouped model the layout
//! engine consumes.
//!
//! Grouping rules:
//! - A profile sub-test groups under its parent profile's name, so every
//!   sub-parameter of one ordered panel prints under a single heading.
//! - A standalone test groups under its department, falling back to the
//!   nested master-data department and finally to "GENERAL TESTS".
//! - Category order is first-seen order; items keep their supplied order
//!   within a category. Nothing is alphabetized.
//!
//! Field resolution is a first-non-empty fallback chain per attribute
//! (item's own field, then the nested master record, then empty). A report
//! with no usable test items yields a single synthetic placeholder group so
//! the caller always has something renderable.

use crate::model::*;

/// Placeholder category when department data is missing. Usually a sign of
/// a data-quality gap upstream, so the substitution is logged.
const FALLBACK_CATEGORY: &str = "GENERAL TESTS";

/// Category name when a profile sub-test carries no profile name.
const FALLBACK_PROFILE: &str = "PROFILE";

/// Build the normalized report document from a raw payload.
pub fn build_document(raw: &RawReport) -> ReportDocument {
    let (groups, has_data) = group_test_items(&raw.test_items);

    ReportDocument {
        patient: PatientInfo {
            name: non_empty(&raw.patient_name).unwrap_or_else(|| "N/A".to_string()),
            age_sex: format_age_sex(&raw.age, &raw.gender),
            patient_id: non_empty(&raw.patient_id).unwrap_or_else(|| "N/A".to_string()),
            branch: non_empty(&raw.branch_name).unwrap_or_else(|| "N/A".to_string()),
        },
        sid_number: non_empty(&raw.sid_no).unwrap_or_else(|| "N/A".to_string()),
        registered_at: non_empty(&raw.registered_at).unwrap_or_else(|| "N/A".to_string()),
        collected_at: non_empty(&raw.collected_at).unwrap_or_else(|| "N/A".to_string()),
        reported_at: non_empty(&raw.reported_at).unwrap_or_else(|| "N/A".to_string()),
        groups,
        has_data,
    }
}

/// Group raw items into print-order categories. Returns the groups and
/// whether they contain real data (false = synthetic fallback).
pub fn group_test_items(items: &[RawTestItem]) -> (Vec<TestGroup>, bool) {
    let mut groups: Vec<TestGroup> = Vec::new();

    for item in items {
        let Some(entry) = build_entry(item) else {
            continue;
        };
        let category = resolve_category(item);

        match groups.iter_mut().find(|g| g.category_name == category) {
            Some(group) => group.tests.push(entry),
            None => groups.push(TestGroup { category_name: category, tests: vec![entry] }),
        }
    }

    if groups.is_empty() {
        return (vec![fallback_group()], false);
    }
    (groups, true)
}

/// Category resolution: parent profile name for profile sub-tests,
/// department chain otherwise.
fn resolve_category(item: &RawTestItem) -> String {
    if item.profile_sub_test {
        return non_empty(&item.profile_name).unwrap_or_else(|| FALLBACK_PROFILE.to_string());
    }

    non_empty(&item.department)
        .or_else(|| item.master.as_ref().and_then(|m| non_empty(&m.department)))
        .unwrap_or_else(|| {
            log::warn!(
                "test item {:?} has no department; grouping under {FALLBACK_CATEGORY}",
                item.test_name.as_deref().unwrap_or("<unnamed>")
            );
            FALLBACK_CATEGORY.to_string()
        })
}

/// Build one entry from a raw item; `None` for items with nothing to print.
fn build_entry(item: &RawTestItem) -> Option<TestEntry> {
    let name = non_empty(&item.test_name)?;
    let master = item.master.as_ref();

    let sub_results = if item.sub_tests.is_empty() {
        // Standalone test: synthesize a single row from the item itself.
        vec![SubResult {
            name: name.clone(),
            result: non_empty(&item.result).unwrap_or_else(|| "-".to_string()),
            unit: non_empty(&item.unit).or_else(|| master.and_then(|m| non_empty(&m.unit))),
            reference_range: non_empty(&item.reference_range)
                .or_else(|| master.and_then(|m| non_empty(&m.reference_range))),
        }]
    } else {
        item.sub_tests
            .iter()
            .map(|sub| SubResult {
                name: non_empty(&sub.name).unwrap_or_else(|| name.clone()),
                result: non_empty(&sub.result).unwrap_or_else(|| "-".to_string()),
                unit: non_empty(&sub.unit),
                reference_range: non_empty(&sub.reference_range),
            })
            .collect()
    };

    Some(TestEntry {
        name,
        method: non_empty(&item.method).or_else(|| master.and_then(|m| non_empty(&m.method))),
        specimen: non_empty(&item.specimen)
            .or_else(|| master.and_then(|m| non_empty(&m.specimen))),
        notes: non_empty(&item.notes),
        sub_results,
    })
}

/// The synthetic group rendered when a report has no usable test items.
fn fallback_group() -> TestGroup {
    TestGroup {
        category_name: FALLBACK_CATEGORY.to_string(),
        tests: vec![TestEntry {
            name: "No Test Data Available".to_string(),
            method: None,
            specimen: None,
            notes: None,
            sub_results: vec![SubResult {
                name: "No Test Data Available".to_string(),
                result: "-".to_string(),
                unit: None,
                reference_range: None,
            }],
        }],
    }
}

fn format_age_sex(age: &Option<String>, gender: &Option<String>) -> String {
    match (non_empty(age), non_empty(gender)) {
        (Some(a), Some(g)) => format!("{a} / {g}"),
        (Some(a), None) => a,
        (None, Some(g)) => g,
        (None, None) => "N/A".to_string(),
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, department: &str) -> RawTestItem {
        RawTestItem {
            test_name: Some(name.to_string()),
            department: Some(department.to_string()),
            result: Some("1.0".to_string()),
            ..Default::default()
        }
    }

    fn profile_item(name: &str, profile: &str) -> RawTestItem {
        RawTestItem {
            test_name: Some(name.to_string()),
            profile_sub_test: true,
            profile_name: Some(profile.to_string()),
            result: Some("1.0".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_report_yields_fallback_group() {
        let (groups, has_data) = group_test_items(&[]);
        assert!(!has_data);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].tests.len(), 1);
        assert_eq!(groups[0].tests[0].sub_results.len(), 1);
        assert_eq!(groups[0].tests[0].name, "No Test Data Available");
        assert_eq!(groups[0].tests[0].sub_results[0].result, "-");
    }

    #[test]
    fn test_items_without_names_are_skipped() {
        let (groups, has_data) = group_test_items(&[RawTestItem::default()]);
        assert!(!has_data, "nameless items alone should fall back");
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_first_seen_category_order() {
        let items = vec![
            item("WBC", "HEMATOLOGY"),
            item("Glucose", "BIOCHEMISTRY"),
            item("RBC", "HEMATOLOGY"),
            item("ALT", "BIOCHEMISTRY"),
        ];
        let (groups, _) = group_test_items(&items);
        let names: Vec<_> = groups.iter().map(|g| g.category_name.as_str()).collect();
        assert_eq!(names, vec!["HEMATOLOGY", "BIOCHEMISTRY"]);
        let hema: Vec<_> = groups[0].tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(hema, vec!["WBC", "RBC"]);
    }

    #[test]
    fn test_profile_sub_tests_group_under_profile_name() {
        let items = vec![
            profile_item("T3", "THYROID PROFILE"),
            profile_item("T4", "THYROID PROFILE"),
            profile_item("TSH", "THYROID PROFILE"),
        ];
        let (groups, has_data) = group_test_items(&items);
        assert!(has_data);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category_name, "THYROID PROFILE");
        assert_eq!(groups[0].tests.len(), 3);
    }

    #[test]
    fn test_missing_department_falls_back() {
        let raw = RawTestItem {
            test_name: Some("Misc".to_string()),
            ..Default::default()
        };
        let (groups, _) = group_test_items(&[raw]);
        assert_eq!(groups[0].category_name, "GENERAL TESTS");
    }

    #[test]
    fn test_master_data_fallback_chain() {
        let raw = RawTestItem {
            test_name: Some("Culture".to_string()),
            master: Some(RawTestMaster {
                department: Some("MICROBIOLOGY".to_string()),
                specimen: Some("Urine".to_string()),
                method: Some("Automated".to_string()),
                unit: Some("CFU/mL".to_string()),
                reference_range: Some("No growth".to_string()),
            }),
            ..Default::default()
        };
        let (groups, _) = group_test_items(&[raw]);
        let entry = &groups[0].tests[0];
        assert_eq!(groups[0].category_name, "MICROBIOLOGY");
        assert_eq!(entry.specimen.as_deref(), Some("Urine"));
        assert_eq!(entry.method.as_deref(), Some("Automated"));
        assert_eq!(entry.sub_results[0].unit.as_deref(), Some("CFU/mL"));
        assert_eq!(entry.sub_results[0].reference_range.as_deref(), Some("No growth"));
    }

    #[test]
    fn test_own_field_wins_over_master() {
        let raw = RawTestItem {
            test_name: Some("Culture".to_string()),
            specimen: Some("Blood".to_string()),
            master: Some(RawTestMaster {
                specimen: Some("Urine".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (groups, _) = group_test_items(&[raw]);
        assert_eq!(groups[0].tests[0].specimen.as_deref(), Some("Blood"));
    }

    #[test]
    fn test_explicit_sub_tests_become_rows() {
        let raw = RawTestItem {
            test_name: Some("CBC".to_string()),
            department: Some("HEMATOLOGY".to_string()),
            sub_tests: vec![
                RawSubTest { name: Some("Hemoglobin".to_string()), result: Some("13.2".to_string()), ..Default::default() },
                RawSubTest { name: Some("WBC".to_string()), result: None, ..Default::default() },
            ],
            ..Default::default()
        };
        let (groups, _) = group_test_items(&[raw]);
        let subs = &groups[0].tests[0].sub_results;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].result, "13.2");
        assert_eq!(subs[1].result, "-", "absent result displays as dash");
    }

    #[test]
    fn test_patient_fallbacks() {
        let doc = build_document(&RawReport::default());
        assert_eq!(doc.patient.name, "N/A");
        assert_eq!(doc.patient.age_sex, "N/A");
        assert_eq!(doc.sid_number, "N/A");
        assert!(!doc.has_data);
    }

    #[test]
    fn test_age_sex_formatting() {
        assert_eq!(
            format_age_sex(&Some("34 Y".to_string()), &Some("Female".to_string())),
            "34 Y / Female"
        );
        assert_eq!(format_age_sex(&Some("34 Y".to_string()), &None), "34 Y");
    }
}

//! Per-drug ADR counts for the reporting dashboard.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::AdrReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugStatistics {
    pub drug_name: String,
    pub total_reports: usize,
    pub serious_count: usize,
    pub non_serious_count: usize,
    pub last_reported: DateTime<Utc>,
}

/// One row per suspected drug (case-insensitive), most reported first, ties by name.
/// A report naming several drugs counts once towards each.
pub fn drug_statistics(reports: &[AdrReport]) -> Vec<DrugStatistics> {
    let mut by_drug: HashMap<String, DrugStatistics> = HashMap::new();

    for report in reports {
        let serious = report.report.is_serious();
        for name in report.report.drug_names() {
            if name.is_empty() {
                continue;
            }
            let row = by_drug
                .entry(name.to_lowercase())
                .or_insert_with(|| DrugStatistics {
                    drug_name: name.to_string(),
                    total_reports: 0,
                    serious_count: 0,
                    non_serious_count: 0,
                    last_reported: report.created_at,
                });
            row.total_reports += 1;
            if serious {
                row.serious_count += 1;
            } else {
                row.non_serious_count += 1;
            }
            row.last_reported = row.last_reported.max(report.created_at);
        }
    }

    let mut rows: Vec<DrugStatistics> = by_drug.into_values().collect();
    rows.sort_by(|a, b| {
        b.total_reports
            .cmp(&a.total_reports)
            .then_with(|| a.drug_name.to_lowercase().cmp(&b.drug_name.to_lowercase()))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Seriousness, SuspectedMedication};
    use crate::validation::tests::valid_report;
    use chrono::Duration;

    fn report(id: u64, drugs: &[&str], serious: bool, age_days: i64) -> AdrReport {
        let mut r = valid_report();
        r.suspected_medications = drugs.iter().map(|d| SuspectedMedication::named(d)).collect();
        r.seriousness = if serious { vec![Seriousness::Hospitalization] } else { Vec::new() };
        AdrReport {
            id,
            report: r,
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    #[test]
    fn counts_by_drug_and_seriousness() {
        let newest = report(3, &["metformin"], false, 0);
        let reports = vec![
            report(1, &["Metformin", "Lisinopril"], true, 5),
            report(2, &["Lisinopril"], false, 3),
            newest.clone(),
            report(4, &["Amoxicillin"], true, 1),
        ];
        let stats = drug_statistics(&reports);
        let names: Vec<&str> = stats.iter().map(|s| s.drug_name.as_str()).collect();
        assert_eq!(names, vec!["Lisinopril", "Metformin", "Amoxicillin"]);

        let metformin = &stats[1];
        assert_eq!(metformin.total_reports, 2);
        assert_eq!(metformin.serious_count, 1);
        assert_eq!(metformin.non_serious_count, 1);
        assert_eq!(metformin.last_reported, newest.created_at);
    }

    #[test]
    fn no_reports_no_rows() {
        assert!(drug_statistics(&[]).is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let stats = drug_statistics(&[report(1, &["Ibuprofen"], true, 0)]);
        let v = serde_json::to_value(&stats[0]).unwrap();
        assert_eq!(v["drugName"], "Ibuprofen");
        assert_eq!(v["seriousCount"], 1);
        assert_eq!(v["nonSeriousCount"], 0);
        assert!(v["lastReported"].is_string());
    }
}

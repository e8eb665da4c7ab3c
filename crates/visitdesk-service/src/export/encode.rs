//! Spreadsheet (CSV) encoding of visitors and audit entries.

use chrono::{DateTime, SecondsFormat, Utc};

use visitdesk_core::error::AppError;
use visitdesk_entity::audit::AuditLogEntry;
use visitdesk_entity::visitor::Visitor;

/// Column headers of the visitor export, in output order.
pub const VISITOR_COLUMNS: [&str; 21] = [
    "Visitor ID",
    "First Name",
    "Last Name",
    "Phone",
    "Email",
    "Visitor Type",
    "Resident Name",
    "Resident Room",
    "Relationship",
    "Purpose",
    "Company",
    "Vehicle Registration",
    "Status",
    "Check-In Time",
    "Check-Out Time",
    "Duration (minutes)",
    "Temperature (C)",
    "Screening Passed",
    "Badge Number",
    "Evacuated At",
    "Notes",
];

/// Column headers of the audit export, in output order.
pub const AUDIT_COLUMNS: [&str; 8] = [
    "Timestamp",
    "Actor",
    "Actor ID",
    "Action",
    "Target Type",
    "Target ID",
    "IP Address",
    "Details",
];

fn ts(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn opt(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or("")
}

/// Encode visitors as CSV with a header row.
pub fn visitors_csv(visitors: &[Visitor], now: DateTime<Utc>) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(VISITOR_COLUMNS)?;
    for v in visitors {
        let duration = v
            .ended_at()
            .map(|_| v.visit_duration(now).num_minutes().to_string())
            .unwrap_or_default();
        let temperature = v
            .health_screening
            .temperature_celsius
            .map(|t| format!("{t:.1}"))
            .unwrap_or_default();
        let screening = if v.health_screening.is_screened() {
            if v.health_screening.passed { "yes" } else { "no" }
        } else {
            ""
        };
        let check_in = ts(Some(v.check_in_time));
        let check_out = ts(v.check_out_time);
        let evacuated = ts(v.evacuated_at);
        let record: [&str; 21] = [
            &v.id,
            &v.first_name,
            &v.last_name,
            opt(&v.phone),
            opt(&v.email),
            v.visitor_type.as_str(),
            opt(&v.resident_name),
            opt(&v.resident_room),
            opt(&v.relationship),
            &v.purpose,
            opt(&v.company),
            opt(&v.vehicle_registration),
            v.status.as_str(),
            &check_in,
            &check_out,
            &duration,
            &temperature,
            screening,
            &v.badge_number,
            &evacuated,
            opt(&v.notes),
        ];
        writer.write_record(record)?;
    }
    finish(writer)
}

/// Encode audit entries as CSV with a header row.
pub fn audit_csv(entries: &[AuditLogEntry]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(AUDIT_COLUMNS)?;
    for e in entries {
        let actor_id = e.actor_id.map(|id| id.to_string()).unwrap_or_default();
        let details = if e.details.is_null() {
            String::new()
        } else {
            e.details.to_string()
        };
        let at = ts(Some(e.created_at));
        let record: [&str; 8] = [
            &at,
            opt(&e.actor_name),
            &actor_id,
            &e.action,
            &e.target_type,
            opt(&e.target_id),
            opt(&e.ip_address),
            &details,
        ];
        writer.write_record(record)?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("Failed to flush CSV output: {}", e.error())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use visitdesk_entity::audit::CreateAuditLogEntry;
    use visitdesk_entity::visitor::{HealthScreening, NewVisitor};

    fn sample(now: DateTime<Utc>) -> Visitor {
        let mut v = Visitor::check_in(
            NewVisitor {
                first_name: "Anne-Marie".into(),
                last_name: "O'Neil, Jr".into(),
                purpose: "Visit \"Nan\"".into(),
                health_screening: HealthScreening {
                    temperature_celsius: Some(36.55),
                    ..Default::default()
                },
                ..Default::default()
            },
            None,
            now - Duration::minutes(45),
        );
        v.health_screening.evaluate(37.5, now);
        v.mark_checked_out(None, now).unwrap();
        v
    }

    #[test]
    fn visitor_rows_follow_column_order_and_quote() {
        let now = Utc::now();
        let v = sample(now);
        let bytes = visitors_csv(std::slice::from_ref(&v), now).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, VISITOR_COLUMNS);

        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], v.id);
        assert_eq!(&row[2], "O'Neil, Jr");
        assert_eq!(&row[9], "Visit \"Nan\"");
        assert_eq!(&row[12], "checked_out");
        assert_eq!(&row[15], "45");
        assert_eq!(&row[17], "yes");
        assert_eq!(&row[19], "");
    }

    #[test]
    fn on_site_visitor_has_blank_duration() {
        let now = Utc::now();
        let v = Visitor::check_in(NewVisitor::default(), None, now);
        let bytes = visitors_csv(&[v], now).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[14], "");
        assert_eq!(&row[15], "");
        assert_eq!(&row[17], "");
    }

    #[test]
    fn audit_rows_embed_details_json() {
        let entry = AuditLogEntry::from_create(
            CreateAuditLogEntry {
                actor_id: None,
                actor_name: Some("system".into()),
                action: "backup.completed".into(),
                target_type: "backup".into(),
                target_id: None,
                details: serde_json::json!({ "files": 2 }),
                ip_address: None,
            },
            Utc::now(),
        );
        let bytes = audit_csv(&[entry]).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[3], "backup.completed");
        assert_eq!(&row[7], r#"{"files":2}"#);
    }

    #[test]
    fn empty_export_is_just_headers() {
        let bytes = visitors_csv(&[], Utc::now()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Visitor ID,First Name"));
    }
}

use chrono::{TimeZone, Utc};
use dak::domain::{
    DakDocument, Direction, DocumentPatch, NewDocument, Priority, Status, ValidationError,
};

#[cfg(test)]
mod new_document_tests {
    use super::*;

    #[test]
    fn test_normalize_fills_defaults() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 15, 0).unwrap();
        let row = NewDocument::inward("Budget circular", "Finance Ministry", "dept-1")
            .normalize(now)
            .expect("valid document");

        assert_eq!(row.direction, Direction::Inward);
        assert_eq!(row.branch, "main");
        assert_eq!(row.priority, Priority::Medium);
        assert_eq!(row.status, Status::Received);
        assert_eq!(row.date_received, now);
        assert_eq!(row.department_id.as_deref(), Some("dept-1"));
    }

    #[test]
    fn test_blank_optionals_become_explicit_nulls() {
        let mut fields = NewDocument::inward("Subject", "Sender", "dept-1");
        fields.reference_number = Some("".to_string());
        fields.remarks = Some("   ".to_string());
        fields.content = Some("Body text".to_string());

        let row = fields.normalize(Utc::now()).unwrap();
        let json = serde_json::to_value(&row).unwrap();

        assert!(json["reference_number"].is_null());
        assert!(json["remarks"].is_null());
        assert!(json["due_date"].is_null());
        assert_eq!(json["content"], "Body text");
        assert_eq!(json["type"], "inward");
        // Nulls are present, not omitted.
        assert!(json.as_object().unwrap().contains_key("sender_address"));
    }

    #[test]
    fn test_missing_required_fields_are_listed() {
        let fields = NewDocument {
            direction: Some(Direction::Inward),
            subject: "  ".to_string(),
            sender: String::new(),
            ..NewDocument::default()
        };

        let err = fields.normalize(Utc::now()).unwrap_err();

        assert_eq!(
            err,
            ValidationError::MissingFields {
                missing: vec!["department", "subject", "sender"]
            }
        );
        assert!(err.to_string().starts_with("Please fill all required fields"));
    }

    #[test]
    fn test_missing_direction_is_rejected() {
        let fields = NewDocument {
            direction: None,
            ..NewDocument::inward("Subject", "Sender", "dept-1")
        };

        let err = fields.normalize(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_outward_keeps_explicit_status() {
        let mut fields = NewDocument::outward("Reply", "Registrar", "dept-2");
        fields.status = Some(Status::Draft);
        fields.priority = Some(Priority::Urgent);

        let row = fields.normalize(Utc::now()).unwrap();

        assert_eq!(row.direction, Direction::Outward);
        assert_eq!(row.status, Status::Draft);
        assert_eq!(row.priority, Priority::Urgent);
    }
}

#[cfg(test)]
mod row_tests {
    use super::*;

    #[test]
    fn test_row_with_joined_department_deserializes() {
        let json = r#"{
            "id": "0b5c",
            "dak_number": "IN/2026/00001",
            "reference_number": null,
            "type": "inward",
            "subject": "Audit observations",
            "sender": "Accountant General",
            "sender_address": null,
            "receiver": null,
            "receiver_address": null,
            "department_id": "d1",
            "branch": "main",
            "priority": "high",
            "status": "under_process",
            "date_received": "2026-10-19T08:00:00+00:00",
            "date_sent": null,
            "due_date": "2026-10-25",
            "content": null,
            "remarks": null,
            "created_by": null,
            "assigned_to": null,
            "created_at": "2026-10-19T08:00:01.123456+00:00",
            "updated_at": "2026-10-19T08:00:01.123456+00:00",
            "departments": { "name": "Accounts", "code": "ACC" }
        }"#;

        let doc: DakDocument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.direction, Direction::Inward);
        assert_eq!(doc.status, Status::UnderProcess);
        assert_eq!(doc.priority, Priority::High);
        assert_eq!(doc.department_name(), Some("Accounts"));
        assert_eq!(
            doc.due_date,
            Some(Utc.with_ymd_and_hms(2026, 10, 25, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_row_without_department_deserializes() {
        let json = r#"{
            "id": "1",
            "dak_number": "OUT/2026/00003",
            "type": "outward",
            "subject": "Reply",
            "sender": "Registrar",
            "priority": "low",
            "status": "sent",
            "date_received": "2026-10-19T08:00:00Z",
            "created_at": "2026-10-19T08:00:00Z",
            "updated_at": "2026-10-19T08:00:00Z",
            "departments": null
        }"#;

        let doc: DakDocument = serde_json::from_str(json).unwrap();

        assert!(doc.departments.is_none());
        assert_eq!(doc.department_name(), None);
        assert_eq!(doc.branch, "main");
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let json = r#"{
            "id": "1", "dak_number": "X", "type": "inward", "subject": "s", "sender": "s",
            "priority": "low", "status": "archived",
            "date_received": "2026-10-19T08:00:00Z",
            "created_at": "2026-10-19T08:00:00Z",
            "updated_at": "2026-10-19T08:00:00Z"
        }"#;

        assert!(serde_json::from_str::<DakDocument>(json).is_err());
    }
}

#[cfg(test)]
mod patch_tests {
    use super::*;

    #[test]
    fn test_empty_patch() {
        assert!(DocumentPatch::default().is_empty());
        assert!(!DocumentPatch::status(Status::Forwarded).is_empty());
    }

    #[test]
    fn test_patch_columns_use_wire_names() {
        let patch = DocumentPatch {
            direction: Some(Direction::Outward),
            subject: Some("Renamed".to_string()),
            assigned_to: Some(Some("user-9".to_string())),
            ..DocumentPatch::default()
        };

        let columns = patch.to_columns().unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns["type"], "outward");
        assert_eq!(columns["subject"], "Renamed");
        assert_eq!(columns["assigned_to"], "user-9");
    }
}

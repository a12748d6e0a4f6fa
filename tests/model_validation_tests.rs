use heritage_portal::models::{ContentRecord, Lang, LocalizedText, Profile, Role};
use serde_json::json;

#[cfg(test)]
mod role_tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_wire_strings() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn unknown_role_strings_do_not_parse() {
        assert!("Admin".parse::<Role>().is_err());
        assert!("superuser".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }
}

#[cfg(test)]
mod profile_tests {
    use super::*;

    #[test]
    fn profile_reads_defensively_from_raw_fields() {
        let profile = Profile::from_fields(&json!({
            "name": "Ann",
            "email": "ann@example.com",
            "role": "admin"
        }));
        assert_eq!(profile.name.as_deref(), Some("Ann"));
        assert_eq!(profile.role, Some(Role::Admin));

        // Legacy documents: missing, empty, or unknown role means no role.
        for fields in [
            json!({"email": "x@example.com"}),
            json!({"email": "x@example.com", "role": ""}),
            json!({"email": "x@example.com", "role": "moderator"}),
        ] {
            let profile = Profile::from_fields(&fields);
            assert_eq!(profile.role, None, "fields {fields}");
        }
    }
}

#[cfg(test)]
mod localized_text_tests {
    use super::*;

    #[test]
    fn missing_translations_fall_back_to_thai() {
        let text = LocalizedText::new("วัด");
        assert_eq!(text.get(Lang::Th), "วัด");
        assert_eq!(text.get(Lang::Ms), "วัด");
    }

    #[test]
    fn blank_translations_never_shadow_the_fallback() {
        let text = LocalizedText::new("วัด").with(Lang::Ms, "");
        assert_eq!(text.get(Lang::Ms), "วัด");

        let text = LocalizedText::new("วัด").with(Lang::Ms, "Kuil");
        assert_eq!(text.get(Lang::Ms), "Kuil");
    }
}

#[cfg(test)]
mod content_record_tests {
    use super::*;

    #[test]
    fn record_rehydrates_from_the_flat_wire_format() {
        let record = ContentRecord::from_fields(
            "abc",
            &json!({
                "title": "พิพิธภัณฑ์",
                "title_ms": "Muzium",
                "description": "คำอธิบาย",
                "description_ms": "",
                "image": "https://img.example.com/m.jpg",
                "link": "",
                "created_at": "2025-06-01T08:00:00+00:00"
            }),
        );

        assert_eq!(record.id, "abc");
        assert_eq!(record.title.get(Lang::Ms), "Muzium");
        // Empty Malay description falls back.
        assert_eq!(record.description.get(Lang::Ms), "คำอธิบาย");
        // Empty link is absent, not an empty string.
        assert_eq!(record.link, None);
        assert!(record.created_at.is_some());
        assert_eq!(record.updated_at, None);
    }

    #[test]
    fn localize_flattens_one_locale_per_view() {
        let record = ContentRecord::from_fields(
            "abc",
            &json!({
                "title": "สมุนไพร",
                "title_ms": "Herba",
                "description": "คำอธิบาย",
                "image": "x.jpg"
            }),
        );

        let th = record.localize(Lang::Th);
        assert_eq!(th.title, "สมุนไพร");
        let ms = record.localize(Lang::Ms);
        assert_eq!(ms.title, "Herba");
        assert_eq!(ms.description, "คำอธิบาย");
    }

    #[test]
    fn malformed_timestamps_are_dropped_rather_than_failing() {
        let record = ContentRecord::from_fields(
            "abc",
            &json!({
                "title": "ชื่อ",
                "description": "คำอธิบาย",
                "image": "x.jpg",
                "created_at": "yesterday"
            }),
        );
        assert_eq!(record.created_at, None);
    }
}

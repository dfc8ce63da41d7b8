//! Test utilities for the backend crate.
//!
//! Shared fixtures for unit tests under `src/`. Compiled for tests and when
//! the `test-support` feature is enabled.

pub mod clock {
    //! Deterministic clocks.

    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, Local, TimeZone, Utc};
    use mockable::Clock;

    /// Timestamp used as "now" across fixtures.
    pub fn fixture_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    /// Clock that only moves when told to.
    #[derive(Debug)]
    pub struct SteppingClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl SteppingClock {
        /// Start at `now`.
        pub fn starting_at(now: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().expect("clock lock");
            *now += by;
        }
    }

    impl Clock for SteppingClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.now.lock().expect("clock lock")
        }
    }

    /// Fixed clock at [`fixture_timestamp`].
    pub fn fixture_clock() -> Arc<SteppingClock> {
        Arc::new(SteppingClock::starting_at(fixture_timestamp()))
    }
}

pub mod users {
    //! Profile fixtures.

    use crate::domain::{Role, User, UserDraft, UserId};

    use super::clock::fixture_timestamp;

    fn build(id: &str, email: &str, first: &str, role: Role) -> User {
        User::try_from(UserDraft {
            id: UserId::new(id).expect("fixture id"),
            email: email.to_owned(),
            first_name: first.to_owned(),
            last_name: "Dela Cruz".to_owned(),
            middle_name: None,
            contact_number: "09171234567".to_owned(),
            address: "12 Mabini St, Barangay Uno".to_owned(),
            role,
            is_active: true,
            created_at: fixture_timestamp(),
            updated_at: fixture_timestamp(),
        })
        .expect("valid fixture user")
    }

    /// Resident who owns fixture applications.
    pub fn resident() -> User {
        build(
            "11111111-1111-4111-8111-111111111111",
            "juan@example.ph",
            "Juan",
            Role::Resident,
        )
    }

    /// A second resident.
    pub fn other_resident() -> User {
        build(
            "33333333-3333-4333-8333-333333333333",
            "ana@example.ph",
            "Ana",
            Role::Resident,
        )
    }

    /// Barangay administrator.
    pub fn admin() -> User {
        build(
            "22222222-2222-4222-8222-222222222222",
            "kapitan@example.ph",
            "Ramon",
            Role::Admin,
        )
    }

    /// Staff member with read access.
    pub fn staff() -> User {
        build(
            "44444444-4444-4444-8444-444444444444",
            "clerk@example.ph",
            "Liza",
            Role::Staff,
        )
    }
}

pub mod applications {
    //! Application fixtures.

    use chrono::{DateTime, Utc};

    use crate::domain::{
        Application, AttachmentDraft, DocumentTypeId, NewApplication, Purpose, TrackingNumber,
        User, default_document_types,
    };

    /// A small PDF attachment.
    pub fn pdf_attachment() -> AttachmentDraft {
        AttachmentDraft {
            file_name: "valid-id.pdf".to_owned(),
            file_type: "application/pdf".to_owned(),
            file_size: 204_800,
        }
    }

    /// Identifier of the seeded "Barangay Clearance" type.
    pub fn clearance_id() -> DocumentTypeId {
        default_document_types()
            .into_iter()
            .find(|doc| doc.name() == "Barangay Clearance")
            .map(|doc| *doc.id())
            .expect("clearance is seeded")
    }

    /// Pending application owned by `owner`.
    pub fn pending_for(owner: &User, tracking: &str, at: DateTime<Utc>) -> Application {
        Application::submit(
            NewApplication {
                user_id: *owner.id(),
                document_type_id: clearance_id(),
                purpose: Purpose::new("Employment requirement").expect("valid purpose"),
                attachments: vec![pdf_attachment()],
            },
            TrackingNumber::parse(tracking).expect("valid tracking number"),
            at,
        )
        .expect("valid application")
    }
}

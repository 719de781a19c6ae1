use uuid::Uuid;

/// Who a progress row or completion belongs to.
///
/// Exactly one of user/device is ever set on the wire: signed-in users are
/// attributed by their auth user id, everyone else by a durable per-install
/// device id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    User(Uuid),
    Device(Uuid),
}

impl Identity {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Identity::User(id) => Some(*id),
            Identity::Device(_) => None,
        }
    }

    pub fn device_id(&self) -> Option<Uuid> {
        match self {
            Identity::User(_) => None,
            Identity::Device(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::User(_))
    }

    /// PostgREST filter selecting this identity's rows
    pub fn filter(&self) -> String {
        match self {
            Identity::User(id) => format!("user_id=eq.{}", id),
            Identity::Device(id) => format!("device_id=eq.{}", id),
        }
    }

    /// Upsert conflict target column for this identity
    pub fn conflict_column(&self) -> &'static str {
        match self {
            Identity::User(_) => "user_id",
            Identity::Device(_) => "device_id",
        }
    }
}

/// An active Supabase auth session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_filter() {
        let id = Uuid::nil();
        assert_eq!(
            Identity::User(id).filter(),
            "user_id=eq.00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            Identity::Device(id).filter(),
            "device_id=eq.00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_identity_sides() {
        let id = Uuid::new_v4();
        assert_eq!(Identity::User(id).user_id(), Some(id));
        assert_eq!(Identity::User(id).device_id(), None);
        assert!(Identity::User(id).is_authenticated());
        assert!(!Identity::Device(id).is_authenticated());
    }
}

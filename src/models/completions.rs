use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::Identity;

/// One finished routine session.
///
/// Immutable once created; removal is a soft delete that also rolls the
/// progress aggregate back by this record's duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub routine_id: String,
    pub completed_at: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl CompletionRecord {
    pub fn new(
        identity: Identity,
        routine_id: &str,
        duration_minutes: u32,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: identity.user_id(),
            device_id: identity.device_id(),
            routine_id: routine_id.to_string(),
            completed_at,
            duration_minutes,
        }
    }

    /// Attribution of this record, if either side is set.
    pub fn identity(&self) -> Option<Identity> {
        self.user_id
            .map(Identity::User)
            .or(self.device_id.map(Identity::Device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_exactly_one_attribution_side() {
        let user = Uuid::new_v4();
        let record = CompletionRecord::new(Identity::User(user), "neck-reset", 5, Utc::now());
        assert_eq!(record.user_id, Some(user));
        assert_eq!(record.device_id, None);
        assert_eq!(record.identity(), Some(Identity::User(user)));

        let device = Uuid::new_v4();
        let record = CompletionRecord::new(Identity::Device(device), "neck-reset", 5, Utc::now());
        assert_eq!(record.user_id, None);
        assert_eq!(record.device_id, Some(device));
    }
}

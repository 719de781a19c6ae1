// Remote CRUD operations for the user_progress table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{SupabaseClient, SyncError};
use crate::models::identity::Identity;
use crate::models::progress::ProgressState;

const TABLE: &str = "user_progress";

/// Payload for upserting a progress row to Supabase
#[derive(Serialize)]
struct ProgressPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<Uuid>,
    streak: u32,
    daily_minutes: u32,
    total_minutes: u32,
    last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ProgressRow {
    streak: u32,
    daily_minutes: u32,
    total_minutes: u32,
    last_activity: Option<DateTime<Utc>>,
}

impl From<ProgressRow> for ProgressState {
    fn from(row: ProgressRow) -> Self {
        ProgressState {
            streak: row.streak,
            daily_minutes: row.daily_minutes,
            total_minutes: row.total_minutes,
            last_activity: row.last_activity,
        }
    }
}

/// Fetch the progress row for an identity. Fails if no row exists yet.
pub async fn fetch_progress(
    client: &SupabaseClient,
    identity: &Identity,
    access_token: Option<&str>,
) -> Result<ProgressState, SyncError> {
    let query = format!(
        "{}&select=streak,daily_minutes,total_minutes,last_activity",
        identity.filter()
    );

    let mut rows: Vec<ProgressRow> = client.select(TABLE, &query, access_token).await?;
    rows.pop()
        .map(ProgressState::from)
        .ok_or_else(|| SyncError::NotFound(format!("progress row for {}", identity.filter())))
}

/// Upsert the full progress aggregate for an identity.
pub async fn upsert_progress(
    client: &SupabaseClient,
    identity: &Identity,
    state: &ProgressState,
    access_token: Option<&str>,
) -> Result<(), SyncError> {
    let payload = ProgressPayload {
        user_id: identity.user_id(),
        device_id: identity.device_id(),
        streak: state.streak,
        daily_minutes: state.daily_minutes,
        total_minutes: state.total_minutes,
        last_activity: state.last_activity,
    };

    let query = format!("on_conflict={}", identity.conflict_column());
    let _rows: Vec<ProgressRow> = client.upsert(TABLE, &query, &payload, access_token).await?;
    Ok(())
}

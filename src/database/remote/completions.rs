// Remote CRUD operations for the routine_completions table

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::{SupabaseClient, SyncError};
use crate::models::completions::CompletionRecord;
use crate::models::identity::Identity;

const TABLE: &str = "routine_completions";

/// Payload for inserting a completion to Supabase
///
/// `completed_at` is deliberately omitted: the server stamps it, so clock
/// skew on the device never pollutes the remote history.
#[derive(Serialize)]
struct CompletionPayload<'a> {
    id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_id: Option<Uuid>,
    routine_id: &'a str,
    duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionRow {
    id: Uuid,
    user_id: Option<Uuid>,
    device_id: Option<Uuid>,
    routine_id: String,
    completed_at: DateTime<Utc>,
    duration_minutes: u32,
}

impl From<CompletionRow> for CompletionRecord {
    fn from(row: CompletionRow) -> Self {
        CompletionRecord {
            id: row.id,
            user_id: row.user_id,
            device_id: row.device_id,
            routine_id: row.routine_id,
            completed_at: row.completed_at,
            duration_minutes: row.duration_minutes,
        }
    }
}

/// Insert a completion. Retries with the same client id are idempotent
/// (merge-duplicates on the primary key). Returns the stored id.
pub async fn record_completion(
    client: &SupabaseClient,
    record: &CompletionRecord,
    access_token: Option<&str>,
) -> Result<Uuid, SyncError> {
    let payload = CompletionPayload {
        id: record.id,
        user_id: record.user_id,
        device_id: record.device_id,
        routine_id: &record.routine_id,
        duration_minutes: record.duration_minutes,
    };

    let mut rows: Vec<CompletionRow> = client.upsert(TABLE, "", &payload, access_token).await?;
    rows.pop()
        .map(|r| r.id)
        .ok_or_else(|| SyncError::ParseError("No row returned from insert".to_string()))
}

/// Fetch an identity's non-deleted completions from the last `days` days.
pub async fn fetch_recent_completions(
    client: &SupabaseClient,
    identity: &Identity,
    days: i64,
    access_token: Option<&str>,
) -> Result<Vec<CompletionRecord>, SyncError> {
    let cutoff = (Utc::now() - chrono::Duration::days(days))
        .to_rfc3339_opts(SecondsFormat::Secs, true);
    let query = format!(
        "{}&completed_at=gte.{}&deleted_at=is.null&select=id,user_id,device_id,routine_id,completed_at,duration_minutes",
        identity.filter(),
        cutoff
    );

    let rows: Vec<CompletionRow> = client.select(TABLE, &query, access_token).await?;
    Ok(rows.into_iter().map(CompletionRecord::from).collect())
}

#[derive(Serialize)]
struct SoftDeletePayload {
    deleted_at: DateTime<Utc>,
}

/// Mark a completion deleted without removing the row, so server-side
/// aggregates stay auditable.
pub async fn soft_delete_completion(
    client: &SupabaseClient,
    id: Uuid,
    identity: &Identity,
    access_token: Option<&str>,
) -> Result<(), SyncError> {
    let query = format!("id=eq.{}&{}", id, identity.filter());
    let payload = SoftDeletePayload {
        deleted_at: Utc::now(),
    };
    client.patch(TABLE, &query, &payload, access_token).await
}

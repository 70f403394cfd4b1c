//! Fixture builders for transport tags.

use chrono::{DateTime, TimeZone, Utc};
use ttc_schemas::{
    AssignmentStatus, TransportAssignment, TransportLeg, TransportTag, TriageCategory,
};
use uuid::Uuid;

/// Base timestamp all fixtures hang off.
pub fn ts0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()
}

/// A tag with no transport assignment yet.
pub fn tag_unassigned(
    tag_number: &str,
    anonymous_id: &str,
    category: TriageCategory,
) -> TransportTag {
    TransportTag {
        id: Uuid::new_v4(),
        tag_number: tag_number.to_string(),
        anonymous_id: anonymous_id.to_string(),
        triage_category: category,
        transport_assignment: None,
        transport: TransportLeg::default(),
        created_at: ts0(),
        updated_at: ts0(),
    }
}

/// A tag dispatched to `team`, awaiting transport start.
pub fn tag_assigned(
    tag_number: &str,
    anonymous_id: &str,
    category: TriageCategory,
    team: &str,
) -> TransportTag {
    let mut tag = tag_unassigned(tag_number, anonymous_id, category);
    tag.transport_assignment = Some(TransportAssignment {
        team: team.to_string(),
        status: Some(AssignmentStatus::Assigned),
        assigned_at: ts0(),
        updated_at: None,
    });
    tag
}

/// A tag already underway.
pub fn tag_in_progress(
    tag_number: &str,
    anonymous_id: &str,
    category: TriageCategory,
    team: &str,
) -> TransportTag {
    let mut tag = tag_assigned(tag_number, anonymous_id, category, team);
    tag.transport_assignment.as_mut().unwrap().status = Some(AssignmentStatus::InProgress);
    tag
}

//! Session state transitions
//!
//! Pure functions: full prior snapshot in, full next snapshot out. The
//! manager owns loading and persisting; nothing here touches storage, so
//! every invariant is checkable with plain values.
//!
//! ```text
//! (no record) ─start→ RUNNING ─pause→ PAUSED ─resume→ RUNNING
//!                        │                │
//!                        └────stop────────┘
//!                                ↓
//!                            STOPPED ─resume→ RUNNING   (re-open, clock rebased)
//! ```
//!
//! An IDLE record exists only when items were added before the timer ever
//! started; `start` absorbs it.
//!
//! Elapsed-time bookkeeping: while RUNNING, play time is
//! `(now - start_time)/1000 - total_pause_duration`. Pause and stop freeze
//! that value into `elapsed_seconds`; resume-from-pause extends
//! `total_pause_duration` so the formula stays continuous; resume-from-stop
//! rebases `start_time` so play continues exactly where it froze.

use super::error::{SessionError, SessionResult};
use shared::models::{ClubTable, Member, MenuItem};
use shared::session::{OrderLine, SessionSnapshot, SessionStatus, WALK_IN_CUSTOMER};

/// Play time of a running session at `now_ms`.
fn running_elapsed(session: &SessionSnapshot, now_ms: i64) -> i64 {
    (now_ms - session.start_time) / 1000 - session.total_pause_duration
}

/// Begin play on a table.
///
/// A pre-seeded IDLE session is absorbed (items and customer name kept);
/// any other existing session rejects the start and is left untouched.
pub fn start(
    existing: Option<SessionSnapshot>,
    table: &ClubTable,
    now_ms: i64,
) -> SessionResult<SessionSnapshot> {
    let mut session = match existing {
        None => SessionSnapshot::idle(&table.id, &table.name, now_ms),
        Some(s) if s.status == SessionStatus::Idle => s,
        Some(s) => {
            return Err(SessionError::TableOccupied {
                table_id: table.id.clone(),
                status: s.status,
            });
        }
    };

    session.status = SessionStatus::Running;
    session.start_time = now_ms;
    session.elapsed_seconds = 0;
    session.total_pause_duration = 0;
    session.pause_time = None;
    session.updated_at = now_ms;
    Ok(session)
}

/// Pause a running session, freezing its elapsed time.
pub fn pause(mut session: SessionSnapshot, now_ms: i64) -> SessionResult<SessionSnapshot> {
    if session.status != SessionStatus::Running {
        return Err(SessionError::InvalidTransition {
            op: "pause",
            from: session.status,
        });
    }

    session.elapsed_seconds = running_elapsed(&session, now_ms);
    session.status = SessionStatus::Paused;
    session.pause_time = Some(now_ms);
    session.updated_at = now_ms;
    Ok(session)
}

/// Resume a paused or stopped session.
///
/// From PAUSED the pause window is added to `total_pause_duration` and the
/// original `start_time` keeps counting. From STOPPED (re-open) the clock
/// is rebased: `start_time = now - elapsed_seconds * 1000` with pauses
/// reset, so elapsed time continues from the frozen value.
pub fn resume(mut session: SessionSnapshot, now_ms: i64) -> SessionResult<SessionSnapshot> {
    match session.status {
        SessionStatus::Paused => {
            let pause_started = session.pause_time.take().unwrap_or(now_ms);
            session.total_pause_duration += (now_ms - pause_started) / 1000;
            session.status = SessionStatus::Running;
        }
        SessionStatus::Stopped => {
            session.start_time = now_ms - session.elapsed_seconds * 1000;
            session.total_pause_duration = 0;
            session.pause_time = None;
            session.status = SessionStatus::Running;
        }
        from => {
            return Err(SessionError::InvalidTransition { op: "resume", from });
        }
    }

    session.updated_at = now_ms;
    Ok(session)
}

/// Stop the timer, freezing elapsed time for billing.
pub fn stop(mut session: SessionSnapshot, now_ms: i64) -> SessionResult<SessionSnapshot> {
    match session.status {
        SessionStatus::Running => {
            session.elapsed_seconds = running_elapsed(&session, now_ms);
        }
        SessionStatus::Paused => {
            // Already frozen at pause time
            session.pause_time = None;
        }
        from => {
            return Err(SessionError::InvalidTransition { op: "stop", from });
        }
    }

    session.status = SessionStatus::Stopped;
    session.updated_at = now_ms;
    Ok(session)
}

/// Add one unit of a menu item to the session, creating an IDLE session if
/// the table has none yet.
///
/// Allowed in every status; the item's name and price are snapshotted at
/// add time.
pub fn add_item(
    existing: Option<SessionSnapshot>,
    table: &ClubTable,
    item: &MenuItem,
    now_ms: i64,
) -> SessionSnapshot {
    let mut session =
        existing.unwrap_or_else(|| SessionSnapshot::idle(&table.id, &table.name, now_ms));

    match session.items.iter_mut().find(|l| l.item_id == item.id) {
        Some(line) => line.quantity += 1,
        None => session.items.push(OrderLine::from_item(item)),
    }

    session.updated_at = now_ms;
    session
}

/// Remove one unit of a menu item; the line disappears at quantity zero.
///
/// Removing an item that is not on the session is a no-op.
pub fn remove_item(mut session: SessionSnapshot, item_id: &str, now_ms: i64) -> SessionSnapshot {
    if let Some(idx) = session.items.iter().position(|l| l.item_id == item_id) {
        if session.items[idx].quantity > 1 {
            session.items[idx].quantity -= 1;
        } else {
            session.items.remove(idx);
        }
        session.updated_at = now_ms;
    }
    session
}

/// Attach a member, overwriting the walk-in customer label.
pub fn attach_member(
    mut session: SessionSnapshot,
    member: &Member,
    now_ms: i64,
) -> SessionSnapshot {
    session.member_id = Some(member.id.clone());
    session.customer_name = member.name.clone();
    session.updated_at = now_ms;
    session
}

/// Detach the member and restore the walk-in label.
pub fn detach_member(mut session: SessionSnapshot, now_ms: i64) -> SessionSnapshot {
    session.member_id = None;
    session.customer_name = WALK_IN_CUSTOMER.to_string();
    session.updated_at = now_ms;
    session
}

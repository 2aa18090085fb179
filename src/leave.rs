use chrono::{NaiveDate, NaiveDateTime};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::ADMIN_SUBJECT,
    models::{Employee, Leave, LeaveBalance, NewLeave, NewLeaveApprover, NewLeaveBalance,
             NewNotification},
    schema::{employees, leave_approvers, leave_balances, leaves, notifications},
};

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_APPROVED: &str = "Approved";
pub const STATUS_REJECTED: &str = "Rejected";

pub const KIND_LEAVE_REQUEST: &str = "leave_request";
pub const KIND_LEAVE_APPROVED: &str = "leave_approved";
pub const KIND_LEAVE_REJECTED: &str = "leave_rejected";

pub const BUCKET_CASUAL_SICK: &str = "casual_sick";
pub const BUCKET_EARNED_LEAVE: &str = "earned_leave";
pub const BUCKET_COMPENSATORY_OFF: &str = "compensatory_off";

const DEFAULT_CASUAL_SICK_TOTAL: i32 = 12;
const DEFAULT_EARNED_LEAVE_TOTAL: i32 = 18;
const DEFAULT_COMPENSATORY_OFF_TOTAL: i32 = 0;

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("leave request not found")]
    NotFound,
    #[error("leave request is already {0}")]
    AlreadyDecided(String),
    #[error("unknown leave type: {0}")]
    UnknownLeaveType(String),
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

/// Which ledger bucket a leave type deducts from.
pub fn bucket_for_leave_type(leave_type: &str) -> Option<&'static str> {
    match leave_type {
        "Casual Leave" | "Sick Leave" => Some(BUCKET_CASUAL_SICK),
        "Earned Leave" => Some(BUCKET_EARNED_LEAVE),
        "Compensatory Off" => Some(BUCKET_COMPENSATORY_OFF),
        _ => None,
    }
}

/// Inclusive day count of a leave span.
pub fn leave_days(from_date: NaiveDate, to_date: NaiveDate) -> i64 {
    (to_date - from_date).num_days() + 1
}

fn default_balances(employee_id: Uuid) -> Vec<NewLeaveBalance> {
    [
        (BUCKET_CASUAL_SICK, DEFAULT_CASUAL_SICK_TOTAL),
        (BUCKET_EARNED_LEAVE, DEFAULT_EARNED_LEAVE_TOTAL),
        (BUCKET_COMPENSATORY_OFF, DEFAULT_COMPENSATORY_OFF_TOTAL),
    ]
    .into_iter()
    .map(|(bucket, total)| NewLeaveBalance {
        employee_id,
        bucket: bucket.to_string(),
        total,
        used: 0,
        balance: total,
    })
    .collect()
}

/// Fetch an employee's ledger, seeding the policy defaults (12/18/0) the
/// first time it is read.
pub fn ensure_balances(
    conn: &mut PgConnection,
    employee_id: Uuid,
) -> Result<Vec<LeaveBalance>, diesel::result::Error> {
    let existing: i64 = leave_balances::table
        .filter(leave_balances::employee_id.eq(employee_id))
        .count()
        .get_result(conn)?;

    if existing == 0 {
        diesel::insert_into(leave_balances::table)
            .values(default_balances(employee_id))
            .on_conflict_do_nothing()
            .execute(conn)?;
    }

    leave_balances::table
        .filter(leave_balances::employee_id.eq(employee_id))
        .order(leave_balances::bucket.asc())
        .load(conn)
}

pub struct LeaveSubmission {
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
    pub managers: Vec<(Uuid, String)>,
}

/// Create the leave request and fan out one `leave_request` notification per
/// selected manager plus one addressed to the admin, all referencing the
/// same leave id.
pub fn submit(
    conn: &mut PgConnection,
    employee: &Employee,
    submission: LeaveSubmission,
    now: NaiveDateTime,
) -> Result<Leave, LeaveError> {
    if bucket_for_leave_type(&submission.leave_type).is_none() {
        return Err(LeaveError::UnknownLeaveType(submission.leave_type));
    }
    let days = leave_days(submission.from_date, submission.to_date) as i32;

    conn.transaction(|conn| {
        let leave_id = Uuid::new_v4();
        let new_leave = NewLeave {
            id: leave_id,
            employee_id: employee.id,
            leave_type: submission.leave_type.clone(),
            from_date: submission.from_date,
            to_date: submission.to_date,
            days,
            reason: submission.reason.clone(),
            status: STATUS_PENDING.to_string(),
            applied_at: now,
        };
        diesel::insert_into(leaves::table)
            .values(&new_leave)
            .execute(conn)?;

        let approver_rows: Vec<NewLeaveApprover> = submission
            .managers
            .iter()
            .map(|(manager_id, manager_name)| NewLeaveApprover {
                leave_id,
                manager_id: *manager_id,
                manager_name: manager_name.clone(),
            })
            .collect();
        diesel::insert_into(leave_approvers::table)
            .values(&approver_rows)
            .execute(conn)?;

        let payload = json!({
            "employeeName": employee.name,
            "employeeCode": employee.code,
            "leaveType": submission.leave_type,
            "fromDate": submission.from_date,
            "toDate": submission.to_date,
            "days": days,
            "reason": submission.reason,
        });
        let message = format!(
            "{} ({}) requested {} day(s) of {}",
            employee.name, employee.code, days, submission.leave_type
        );

        let mut fanout: Vec<NewNotification> = submission
            .managers
            .iter()
            .map(|(manager_id, manager_name)| NewNotification {
                id: Uuid::new_v4(),
                recipient_id: manager_id.to_string(),
                recipient_name: manager_name.clone(),
                kind: KIND_LEAVE_REQUEST.to_string(),
                leave_id: Some(leave_id),
                employee_id: Some(employee.id),
                message: message.clone(),
                payload: payload.clone(),
                status: Some(STATUS_PENDING.to_string()),
                read: false,
            })
            .collect();
        fanout.push(NewNotification {
            id: Uuid::new_v4(),
            recipient_id: ADMIN_SUBJECT.to_string(),
            recipient_name: "HR Department".to_string(),
            kind: KIND_LEAVE_REQUEST.to_string(),
            leave_id: Some(leave_id),
            employee_id: Some(employee.id),
            message,
            payload,
            status: Some(STATUS_PENDING.to_string()),
            read: false,
        });
        diesel::insert_into(notifications::table)
            .values(&fanout)
            .execute(conn)?;

        let leave = leaves::table.find(leave_id).first(conn)?;
        Ok(leave)
    })
}

/// `Pending -> Approved`. One transaction: the leave row is locked and its
/// status re-checked so a second approval cannot deduct the balance twice.
/// All `leave_request` copies for the leave are resolved together.
pub fn approve(
    conn: &mut PgConnection,
    leave_id: Uuid,
    actor_name: &str,
    actor_role: &str,
    now: NaiveDateTime,
) -> Result<Leave, LeaveError> {
    conn.transaction(|conn| {
        let leave: Leave = leaves::table
            .find(leave_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(LeaveError::NotFound)?;
        if leave.status != STATUS_PENDING {
            return Err(LeaveError::AlreadyDecided(leave.status));
        }
        let bucket = bucket_for_leave_type(&leave.leave_type)
            .ok_or_else(|| LeaveError::UnknownLeaveType(leave.leave_type.clone()))?;

        diesel::update(leaves::table.find(leave_id))
            .set((
                leaves::status.eq(STATUS_APPROVED),
                leaves::decided_by.eq(actor_name),
                leaves::decided_role.eq(actor_role),
                leaves::decided_at.eq(now),
                leaves::updated_at.eq(now),
            ))
            .execute(conn)?;

        resolve_request_copies(conn, leave_id, STATUS_APPROVED, actor_name, now)?;

        let employee: Employee = employees::table.find(leave.employee_id).first(conn)?;
        let message = format!(
            "Your {} request from {} to {} has been approved by {}",
            leave.leave_type,
            leave.from_date.format("%d %b %Y"),
            leave.to_date.format("%d %b %Y"),
            actor_name
        );
        insert_decision_notification(
            conn,
            &leave,
            &employee,
            KIND_LEAVE_APPROVED,
            message,
            json!({ "approvedBy": actor_name }),
        )?;

        deduct_balance(conn, leave.employee_id, bucket, leave.days, now)?;

        let leave = leaves::table.find(leave_id).first(conn)?;
        Ok(leave)
    })
}

/// `Pending -> Rejected`. Same locking discipline as approval; the balance
/// is not touched.
pub fn reject(
    conn: &mut PgConnection,
    leave_id: Uuid,
    actor_name: &str,
    actor_role: &str,
    reason: Option<String>,
    now: NaiveDateTime,
) -> Result<Leave, LeaveError> {
    conn.transaction(|conn| {
        let leave: Leave = leaves::table
            .find(leave_id)
            .for_update()
            .first(conn)
            .optional()?
            .ok_or(LeaveError::NotFound)?;
        if leave.status != STATUS_PENDING {
            return Err(LeaveError::AlreadyDecided(leave.status));
        }

        let reason = reason.unwrap_or_default();
        diesel::update(leaves::table.find(leave_id))
            .set((
                leaves::status.eq(STATUS_REJECTED),
                leaves::decided_by.eq(actor_name),
                leaves::decided_role.eq(actor_role),
                leaves::decided_at.eq(now),
                leaves::rejection_reason.eq(&reason),
                leaves::updated_at.eq(now),
            ))
            .execute(conn)?;

        resolve_request_copies(conn, leave_id, STATUS_REJECTED, actor_name, now)?;

        let employee: Employee = employees::table.find(leave.employee_id).first(conn)?;
        let message = format!(
            "Your {} request from {} to {} has been rejected by {}",
            leave.leave_type,
            leave.from_date.format("%d %b %Y"),
            leave.to_date.format("%d %b %Y"),
            actor_name
        );
        insert_decision_notification(
            conn,
            &leave,
            &employee,
            KIND_LEAVE_REJECTED,
            message,
            json!({ "rejectedBy": actor_name, "rejectionReason": reason }),
        )?;

        let leave = leaves::table.find(leave_id).first(conn)?;
        Ok(leave)
    })
}

/// Resolve the acted-on notification and every sibling `leave_request` copy
/// for the same leave, so stale approve/reject actions disappear everywhere.
fn resolve_request_copies(
    conn: &mut PgConnection,
    leave_id: Uuid,
    status: &str,
    actor_name: &str,
    now: NaiveDateTime,
) -> Result<(), diesel::result::Error> {
    diesel::update(
        notifications::table
            .filter(notifications::leave_id.eq(leave_id))
            .filter(notifications::kind.eq(KIND_LEAVE_REQUEST)),
    )
    .set((
        notifications::status.eq(status),
        notifications::action_by.eq(actor_name),
        notifications::action_at.eq(now),
        notifications::read.eq(true),
    ))
    .execute(conn)?;
    Ok(())
}

fn insert_decision_notification(
    conn: &mut PgConnection,
    leave: &Leave,
    employee: &Employee,
    kind: &str,
    message: String,
    extra: serde_json::Value,
) -> Result<(), diesel::result::Error> {
    let mut payload = json!({
        "leaveType": leave.leave_type,
        "fromDate": leave.from_date,
        "toDate": leave.to_date,
        "days": leave.days,
    });
    if let (Some(base), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }

    let notification = NewNotification {
        id: Uuid::new_v4(),
        recipient_id: employee.id.to_string(),
        recipient_name: employee.name.clone(),
        kind: kind.to_string(),
        leave_id: Some(leave.id),
        employee_id: Some(employee.id),
        message,
        payload,
        status: None,
        read: false,
    };
    diesel::insert_into(notifications::table)
        .values(&notification)
        .execute(conn)?;
    Ok(())
}

/// Deduct `days` from the bucket and recompute `balance = total - used` in
/// the same statement set; never one without the other.
fn deduct_balance(
    conn: &mut PgConnection,
    employee_id: Uuid,
    bucket: &str,
    days: i32,
    now: NaiveDateTime,
) -> Result<(), diesel::result::Error> {
    ensure_balances(conn, employee_id)?;

    let row: LeaveBalance = leave_balances::table
        .find((employee_id, bucket))
        .for_update()
        .first(conn)?;

    let used = row.used + days;
    let balance = row.total - used;
    diesel::update(leave_balances::table.find((employee_id, bucket)))
        .set((
            leave_balances::used.eq(used),
            leave_balances::balance.eq(balance),
            leave_balances::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = employees)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub mobile: String,
    pub password_hash: String,
    pub designation: String,
    pub department: String,
    pub active: bool,
    pub profile_image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = employees)]
pub struct NewEmployee {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub mobile: String,
    pub password_hash: String,
    pub designation: String,
    pub department: String,
    pub active: bool,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = employee_locations)]
#[diesel(primary_key(employee_id))]
#[diesel(belongs_to(Employee, foreign_key = employee_id))]
pub struct EmployeeLocation {
    pub employee_id: Uuid,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = employee_locations)]
pub struct NewEmployeeLocation {
    pub employee_id: Uuid,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub recorded_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = location_history)]
#[diesel(belongs_to(Employee, foreign_key = employee_id))]
pub struct LocationHistoryRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub recorded_at: NaiveDateTime,
    pub employee_name: String,
    pub employee_code: String,
    pub employee_mobile: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = location_history)]
pub struct NewLocationHistoryRecord {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub lat: f64,
    pub lon: f64,
    pub address: String,
    pub recorded_at: NaiveDateTime,
    pub employee_name: String,
    pub employee_code: String,
    pub employee_mobile: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = leaves)]
#[diesel(belongs_to(Employee, foreign_key = employee_id))]
pub struct Leave {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub days: i32,
    pub reason: String,
    pub status: String,
    pub applied_at: NaiveDateTime,
    pub decided_by: Option<String>,
    pub decided_role: Option<String>,
    pub decided_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = leaves)]
pub struct NewLeave {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub days: i32,
    pub reason: String,
    pub status: String,
    pub applied_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = leave_approvers)]
#[diesel(belongs_to(Leave, foreign_key = leave_id))]
#[diesel(primary_key(leave_id, manager_id))]
pub struct LeaveApprover {
    pub leave_id: Uuid,
    pub manager_id: Uuid,
    pub manager_name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = leave_approvers)]
pub struct NewLeaveApprover {
    pub leave_id: Uuid,
    pub manager_id: Uuid,
    pub manager_name: String,
}

#[derive(Debug, Clone, Queryable, Associations)]
#[diesel(table_name = leave_balances)]
#[diesel(belongs_to(Employee, foreign_key = employee_id))]
#[diesel(primary_key(employee_id, bucket))]
pub struct LeaveBalance {
    pub employee_id: Uuid,
    pub bucket: String,
    pub total: i32,
    pub used: i32,
    pub balance: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = leave_balances)]
pub struct NewLeaveBalance {
    pub employee_id: Uuid,
    pub bucket: String,
    pub total: i32,
    pub used: i32,
    pub balance: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: String,
    pub recipient_name: String,
    pub kind: String,
    pub leave_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub message: String,
    pub payload: serde_json::Value,
    pub status: Option<String>,
    pub action_by: Option<String>,
    pub action_at: Option<NaiveDateTime>,
    pub read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub id: Uuid,
    pub recipient_id: String,
    pub recipient_name: String,
    pub kind: String,
    pub leave_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub message: String,
    pub payload: serde_json::Value,
    pub status: Option<String>,
    pub read: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = salary_slips)]
#[diesel(belongs_to(Employee, foreign_key = employee_id))]
pub struct SalarySlip {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub month: String,
    pub year: i32,
    pub file_name: String,
    pub file_data: String,
    pub employee_name: String,
    pub employee_code: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = salary_slips)]
pub struct NewSalarySlip {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub month: String,
    pub year: i32,
    pub file_name: String,
    pub file_data: String,
    pub employee_name: String,
    pub employee_code: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = holidays)]
pub struct Holiday {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = holidays)]
pub struct NewHoliday {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = refresh_tokens)]
pub struct RefreshToken {
    pub id: Uuid,
    pub subject_id: String,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub subject_id: String,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = jobs)]
pub struct Job {
    pub id: Uuid,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub run_after: NaiveDateTime,
    pub last_error: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub id: Uuid,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub run_after: NaiveDateTime,
}

//! Entity models for the hospital schema.
//!
//! Integer primary keys are SQLite rowids; timestamps are UTC. Status
//! fields are typed enums with explicit storage codes so the database
//! never holds a value the application cannot name.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HospitalError;

// ===== Status enums =====

/// Appointment lifecycle state, stored as its integer code (0-4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Open,
    Scheduled,
    Completed,
    Cancelled,
    Expired,
}

impl AppointmentStatus {
    pub fn code(self) -> i64 {
        match self {
            AppointmentStatus::Open => 0,
            AppointmentStatus::Scheduled => 1,
            AppointmentStatus::Completed => 2,
            AppointmentStatus::Cancelled => 3,
            AppointmentStatus::Expired => 4,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, HospitalError> {
        match code {
            0 => Ok(AppointmentStatus::Open),
            1 => Ok(AppointmentStatus::Scheduled),
            2 => Ok(AppointmentStatus::Completed),
            3 => Ok(AppointmentStatus::Cancelled),
            4 => Ok(AppointmentStatus::Expired),
            other => Err(HospitalError::Validation(format!(
                "appointment status code {other} is out of range 0-4"
            ))),
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::Expired
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppointmentStatus::Open => "Open",
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Expired => "Expired",
        };
        write!(f, "{name}")
    }
}

/// How the appointment is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentKind {
    Online,
    Inperson,
}

impl AppointmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentKind::Online => "Online",
            AppointmentKind::Inperson => "Inperson",
        }
    }

    pub fn parse(value: &str) -> Result<Self, HospitalError> {
        match value {
            "Online" => Ok(AppointmentKind::Online),
            "Inperson" => Ok(AppointmentKind::Inperson),
            other => Err(HospitalError::Validation(format!(
                "appointment type must be Online or Inperson, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for AppointmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bed occupancy state. Occupied beds always carry a patient and an
/// assignment date; available beds carry neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BedStatus {
    Available,
    Occupied,
}

impl BedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BedStatus::Available => "Available",
            BedStatus::Occupied => "Occupied",
        }
    }

    pub fn parse(value: &str) -> Result<Self, HospitalError> {
        match value {
            "Available" => Ok(BedStatus::Available),
            "Occupied" => Ok(BedStatus::Occupied),
            other => Err(HospitalError::Validation(format!(
                "bed status must be Available or Occupied, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for BedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which entity table a notification's recipient id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientType {
    Doctor,
    Patient,
    Staff,
}

impl RecipientType {
    pub fn as_str(self) -> &'static str {
        match self {
            RecipientType::Doctor => "Doctor",
            RecipientType::Patient => "Patient",
            RecipientType::Staff => "Staff",
        }
    }

    pub fn parse(value: &str) -> Result<Self, HospitalError> {
        match value {
            "Doctor" => Ok(RecipientType::Doctor),
            "Patient" => Ok(RecipientType::Patient),
            "Staff" => Ok(RecipientType::Staff),
            other => Err(HospitalError::Validation(format!(
                "recipient type must be Doctor, Patient or Staff, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for RecipientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationStatus {
    Unread,
    Read,
}

impl NotificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationStatus::Unread => "Unread",
            NotificationStatus::Read => "Read",
        }
    }

    pub fn parse(value: &str) -> Result<Self, HospitalError> {
        match value {
            "Unread" => Ok(NotificationStatus::Unread),
            "Read" => Ok(NotificationStatus::Read),
            other => Err(HospitalError::Validation(format!(
                "notification status must be Unread or Read, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ===== Entities =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub speciality: String,
    pub phone: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub department: String,
    pub email: String,
    pub hire_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffShift {
    pub id: i64,
    pub staff_id: i64,
    pub shift_start: DateTime<Utc>,
    pub shift_end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub records: String,
    pub phone: Option<String>,
    pub email: String,
    pub doctor_id: Option<i64>,
    pub staff_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: i64,
    pub patient_id: i64,
    pub name: Option<String>,
    pub test_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    /// None marks an open slot awaiting a patient.
    pub patient_id: Option<i64>,
    pub doctor_id: i64,
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub kind: Option<AppointmentKind>,
    /// Snapshot of the doctor's speciality at creation time; never
    /// recomputed, even if the doctor changes later.
    pub speciality: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub record_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ward {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bed {
    pub id: i64,
    pub ward_id: i64,
    pub patient_id: Option<i64>,
    pub status: BedStatus,
    pub assigned_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date_issued: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionDetail {
    pub id: i64,
    pub prescription_id: i64,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient_type: RecipientType,
    pub recipient_id: i64,
    pub message: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

// ===== Create payloads =====

#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub name: String,
    pub speciality: String,
    pub phone: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub name: String,
    pub department: String,
    pub email: String,
    pub hire_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStaffShift {
    pub staff_id: i64,
    pub shift_start: DateTime<Utc>,
    pub shift_end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub records: String,
    pub phone: Option<String>,
    pub email: String,
    pub doctor_id: Option<i64>,
    pub staff_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTestRecord {
    pub patient_id: i64,
    pub name: Option<String>,
    pub test_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: Option<i64>,
    pub doctor_id: i64,
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub kind: Option<AppointmentKind>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMedicalHistory {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub record_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWard {
    pub name: String,
    pub capacity: i64,
}

#[derive(Debug, Clone)]
pub struct NewPrescription {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date_issued: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub details: Vec<NewPrescriptionDetail>,
}

#[derive(Debug, Clone)]
pub struct NewPrescriptionDetail {
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

// ===== Partial updates =====
//
// None keeps the prior value; a field cannot be cleared back to NULL
// through these, matching the console's blank-keeps-previous behavior.

#[derive(Debug, Clone, Default)]
pub struct DoctorUpdate {
    pub name: Option<String>,
    pub speciality: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StaffUpdate {
    pub name: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
    pub hire_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct StaffShiftUpdate {
    pub staff_id: Option<i64>,
    pub shift_start: Option<DateTime<Utc>>,
    pub shift_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub records: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub doctor_id: Option<i64>,
    pub staff_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TestRecordUpdate {
    pub name: Option<String>,
    pub test_date: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentUpdate {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<AppointmentStatus>,
    pub kind: Option<AppointmentKind>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MedicalHistoryUpdate {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub record_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct WardUpdate {
    pub name: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct PrescriptionUpdate {
    pub date_issued: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PrescriptionDetailUpdate {
    pub medication_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
}

// ===== Join projections =====
//
// Query accessors expose names instead of raw foreign keys.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentView {
    pub id: i64,
    pub doctor_name: String,
    pub patient_name: Option<String>,
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub kind: Option<AppointmentKind>,
    pub speciality: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistoryView {
    pub id: i64,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub record_date: DateTime<Utc>,
    pub doctor_name: String,
    pub patient_name: String,
}

/// One row per prescribed medication line, names joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionView {
    pub prescription_id: i64,
    pub doctor_name: String,
    pub patient_name: String,
    pub date_issued: DateTime<Utc>,
    pub notes: Option<String>,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
}

/// Typed search parameter for prescription lookups; each variant maps to
/// one fixed parameterized query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrescriptionSearch {
    PatientId(i64),
    DoctorId(i64),
    PrescriptionId(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for code in 0..=4 {
            let status = AppointmentStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn status_code_out_of_range_is_rejected() {
        assert!(matches!(
            AppointmentStatus::from_code(5),
            Err(HospitalError::Validation(_))
        ));
        assert!(matches!(
            AppointmentStatus::from_code(-1),
            Err(HospitalError::Validation(_))
        ));
    }

    #[test]
    fn terminal_states() {
        assert!(!AppointmentStatus::Open.is_terminal());
        assert!(!AppointmentStatus::Scheduled.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(AppointmentStatus::Expired.is_terminal());
    }

    #[test]
    fn bed_status_parse() {
        assert_eq!(BedStatus::parse("Available").unwrap(), BedStatus::Available);
        assert_eq!(BedStatus::parse("Occupied").unwrap(), BedStatus::Occupied);
        assert!(BedStatus::parse("occupied").is_err());
    }

    #[test]
    fn recipient_type_parse() {
        for name in ["Doctor", "Patient", "Staff"] {
            assert_eq!(RecipientType::parse(name).unwrap().as_str(), name);
        }
        assert!(RecipientType::parse("Nurse").is_err());
    }

    #[test]
    fn appointment_kind_parse() {
        assert_eq!(
            AppointmentKind::parse("Online").unwrap(),
            AppointmentKind::Online
        );
        assert!(AppointmentKind::parse("Phone").is_err());
    }
}

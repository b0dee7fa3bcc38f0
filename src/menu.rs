//! Console menus over the library API.
//!
//! Every operation failure is printed and control returns to the menu
//! loop; nothing here is fatal. Blank input at an update prompt keeps
//! the previous value.

use std::fmt::Debug;
use std::io::{self, Write};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::{HospitalError, Result};
use crate::help::HelpData;
use crate::models::*;
use crate::store::HospitalDb;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn run(db: &HospitalDb, help: &HelpData) -> anyhow::Result<()> {
    loop {
        println!("\n=== Hospital Management ===");
        println!("1. Login");
        println!("2. Patient login");
        println!("0. Quit");
        match prompt("Select")?.as_str() {
            "1" => {
                let username = prompt("Username")?;
                let password = prompt("Password")?;
                match db.verify_login(&username, &password).await? {
                    Some(role) => {
                        println!("Welcome, {username} ({role})");
                        main_menu(db, help).await?;
                    }
                    None => println!("Invalid username or password."),
                }
            }
            "2" => {
                let patient_id = prompt_i64("Patient ID")?;
                let email = prompt("Email")?;
                match db.patient_login(patient_id, &email).await? {
                    Some(patient) => {
                        println!("Welcome, {}", patient.name);
                        patient_menu(db, patient.id).await?;
                    }
                    None => println!("Invalid patient id or email."),
                }
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn main_menu(db: &HospitalDb, help: &HelpData) -> anyhow::Result<()> {
    loop {
        println!("\n=== Main Menu ===");
        println!("1. Doctors");
        println!("2. Staff");
        println!("3. Staff shifts");
        println!("4. Patients");
        println!("5. Test records");
        println!("6. Appointments");
        println!("7. Medical history");
        println!("8. Wards and beds");
        println!("9. Prescriptions");
        println!("10. Notifications");
        println!("11. Help");
        println!("0. Logout");
        match prompt("Select")?.as_str() {
            "1" => doctors_menu(db).await?,
            "2" => staff_menu(db).await?,
            "3" => shifts_menu(db).await?,
            "4" => patients_menu(db).await?,
            "5" => test_records_menu(db).await?,
            "6" => appointments_menu(db).await?,
            "7" => history_menu(db).await?,
            "8" => beds_menu(db).await?,
            "9" => prescriptions_menu(db).await?,
            "10" => notifications_menu(db).await?,
            "11" => help_menu(db, help).await?,
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

/// Patients see their own appointments and notifications only.
async fn patient_menu(db: &HospitalDb, patient_id: i64) -> anyhow::Result<()> {
    loop {
        println!("\n=== Patient Menu ===");
        println!("1. My appointments");
        println!("2. My notifications");
        println!("3. Mark notification read");
        println!("0. Logout");
        match prompt("Select")?.as_str() {
            "1" => report(db.appointments_by_patient(patient_id).await),
            "2" => report(db.notifications_for(RecipientType::Patient, patient_id).await),
            "3" => {
                let id = prompt_i64("Notification ID")?;
                report_optional(db.mark_notification_read(id).await, "notification");
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn doctors_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Doctors ---");
        println!("1. Create  2. List  3. Get  4. Update  5. Delete  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewDoctor {
                    name: prompt("Name")?,
                    speciality: prompt("Speciality")?,
                    phone: prompt_opt("Phone")?,
                    email: prompt("Email")?,
                };
                report(db.create_doctor(new).await);
            }
            "2" => report(db.list_doctors().await),
            "3" => {
                let id = prompt_i64("Doctor ID")?;
                report_optional(db.get_doctor(id).await, "doctor");
            }
            "4" => {
                let id = prompt_i64("Doctor ID")?;
                let update = DoctorUpdate {
                    name: prompt_opt("Name (blank keeps current)")?,
                    speciality: prompt_opt("Speciality (blank keeps current)")?,
                    phone: prompt_opt("Phone (blank keeps current)")?,
                    email: prompt_opt("Email (blank keeps current)")?,
                };
                report_optional(db.update_doctor(id, update).await, "doctor");
            }
            "5" => {
                let id = prompt_i64("Doctor ID")?;
                report_optional(db.delete_doctor(id).await, "doctor");
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn staff_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Staff ---");
        println!("1. Create  2. List  3. Get  4. Update  5. Delete  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewStaff {
                    name: prompt("Name")?,
                    department: prompt("Department")?,
                    email: prompt("Email")?,
                    hire_date: prompt_date("Hire date")?,
                };
                report(db.create_staff(new).await);
            }
            "2" => report(db.list_staff().await),
            "3" => {
                let id = prompt_i64("Staff ID")?;
                report_optional(db.get_staff_member(id).await, "staff member");
            }
            "4" => {
                let id = prompt_i64("Staff ID")?;
                let update = StaffUpdate {
                    name: prompt_opt("Name (blank keeps current)")?,
                    department: prompt_opt("Department (blank keeps current)")?,
                    email: prompt_opt("Email (blank keeps current)")?,
                    hire_date: prompt_date_opt("Hire date (blank keeps current)")?,
                };
                report_optional(db.update_staff(id, update).await, "staff member");
            }
            "5" => {
                let id = prompt_i64("Staff ID")?;
                report_optional(db.delete_staff(id).await, "staff member");
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn shifts_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Staff Shifts ---");
        println!("1. Create  2. List  3. Get  4. By staff member  5. Update  6. Delete  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewStaffShift {
                    staff_id: prompt_i64("Staff ID")?,
                    shift_start: prompt_date("Shift start")?,
                    shift_end: prompt_date("Shift end")?,
                };
                report(db.create_staff_shift(new).await);
            }
            "2" => report(db.list_staff_shifts().await),
            "3" => {
                let id = prompt_i64("Shift ID")?;
                report_optional(db.get_staff_shift(id).await, "shift");
            }
            "4" => {
                let staff_id = prompt_i64("Staff ID")?;
                report(db.staff_shifts_for(staff_id).await);
            }
            "5" => {
                let id = prompt_i64("Shift ID")?;
                let update = StaffShiftUpdate {
                    staff_id: prompt_i64_opt("Staff ID (blank keeps current)")?,
                    shift_start: prompt_date_opt("Shift start (blank keeps current)")?,
                    shift_end: prompt_date_opt("Shift end (blank keeps current)")?,
                };
                report_optional(db.update_staff_shift(id, update).await, "shift");
            }
            "6" => {
                let id = prompt_i64("Shift ID")?;
                report_optional(db.delete_staff_shift(id).await, "shift");
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn patients_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Patients ---");
        println!("1. Create  2. List  3. Get  4. Update  5. Delete  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewPatient {
                    name: prompt("Name")?,
                    records: prompt("Records")?,
                    phone: prompt_opt("Phone")?,
                    email: prompt("Email")?,
                    doctor_id: prompt_i64_opt("Doctor ID (blank for none)")?,
                    staff_id: prompt_i64_opt("Staff ID (blank for none)")?,
                };
                report(db.create_patient(new).await);
            }
            "2" => report(db.list_patients().await),
            "3" => {
                let id = prompt_i64("Patient ID")?;
                report_optional(db.get_patient(id).await, "patient");
            }
            "4" => {
                let id = prompt_i64("Patient ID")?;
                let update = PatientUpdate {
                    name: prompt_opt("Name (blank keeps current)")?,
                    records: prompt_opt("Records (blank keeps current)")?,
                    phone: prompt_opt("Phone (blank keeps current)")?,
                    email: prompt_opt("Email (blank keeps current)")?,
                    doctor_id: prompt_i64_opt("Doctor ID (blank keeps current)")?,
                    staff_id: prompt_i64_opt("Staff ID (blank keeps current)")?,
                };
                report_optional(db.update_patient(id, update).await, "patient");
            }
            "5" => {
                let id = prompt_i64("Patient ID")?;
                report_optional(db.delete_patient(id).await, "patient");
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn test_records_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Test Records ---");
        println!("1. Create  2. List  3. Get  4. Update  5. Delete  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewTestRecord {
                    patient_id: prompt_i64("Patient ID")?,
                    name: prompt_opt("Test name")?,
                    test_date: prompt_date_opt("Test date")?,
                    remarks: prompt_opt("Remarks")?,
                };
                report(db.create_test_record(new).await);
            }
            "2" => report(db.list_test_records().await),
            "3" => {
                let id = prompt_i64("Record ID")?;
                report_optional(db.get_test_record(id).await, "test record");
            }
            "4" => {
                let id = prompt_i64("Record ID")?;
                let update = TestRecordUpdate {
                    name: prompt_opt("Test name (blank keeps current)")?,
                    test_date: prompt_date_opt("Test date (blank keeps current)")?,
                    remarks: prompt_opt("Remarks (blank keeps current)")?,
                };
                report_optional(db.update_test_record(id, update).await, "test record");
            }
            "5" => {
                let id = prompt_i64("Record ID")?;
                report_optional(db.delete_test_record(id).await, "test record");
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn appointments_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Appointments ---");
        println!("1. Create  2. Create open slot  3. List  4. Get  5. Update  6. Delete");
        println!("7. By doctor  8. By patient  9. By speciality  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewAppointment {
                    doctor_id: prompt_i64("Doctor ID")?,
                    patient_id: Some(prompt_i64("Patient ID")?),
                    date: prompt_date("Appointment date")?,
                    status: prompt_status("Status (0-Open, 1-Scheduled, 2-Completed, 3-Cancelled, 4-Expired)")?,
                    kind: prompt_kind("Type (Online or Inperson)")?,
                    notes: prompt_opt("Notes")?,
                };
                report(db.create_appointment(new).await);
            }
            "2" => {
                let new = NewAppointment {
                    doctor_id: prompt_i64("Doctor ID")?,
                    patient_id: None,
                    date: prompt_date("Appointment date")?,
                    status: AppointmentStatus::Open,
                    kind: None,
                    notes: None,
                };
                report(db.create_appointment(new).await);
            }
            "3" => report(db.list_appointments().await),
            "4" => {
                let id = prompt_i64("Appointment ID")?;
                report_optional(db.get_appointment(id).await, "appointment");
            }
            "5" => {
                let id = prompt_i64("Appointment ID")?;
                let update = AppointmentUpdate {
                    doctor_id: prompt_i64_opt("Doctor ID (blank keeps current)")?,
                    patient_id: prompt_i64_opt("Patient ID (blank keeps current)")?,
                    date: prompt_date_opt("Appointment date (blank keeps current)")?,
                    status: prompt_status_opt("Status 0-4 (blank keeps current)")?,
                    kind: prompt_kind("Type (blank keeps current)")?,
                    notes: prompt_opt("Notes (blank keeps current)")?,
                };
                report_optional(db.update_appointment(id, update).await, "appointment");
            }
            "6" => {
                let id = prompt_i64("Appointment ID")?;
                report_optional(db.delete_appointment(id).await, "appointment");
            }
            "7" => {
                let id = prompt_i64("Doctor ID")?;
                report(db.appointments_by_doctor(id).await);
            }
            "8" => {
                let id = prompt_i64("Patient ID")?;
                report(db.appointments_by_patient(id).await);
            }
            "9" => {
                let speciality = prompt("Speciality")?;
                report(db.appointments_by_speciality(&speciality).await);
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn history_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Medical History ---");
        println!("1. Create  2. List  3. Get  4. Update  5. Delete  6. By doctor  7. By patient  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewMedicalHistory {
                    patient_id: prompt_i64("Patient ID")?,
                    doctor_id: prompt_i64("Doctor ID")?,
                    diagnosis: prompt("Diagnosis")?,
                    treatment: prompt_opt("Treatment")?,
                    record_date: prompt_date("Record date")?,
                };
                report(db.create_medical_history(new).await);
            }
            "2" => report(db.list_medical_history().await),
            "3" => {
                let id = prompt_i64("History ID")?;
                report_optional(db.get_medical_history(id).await, "medical history");
            }
            "4" => {
                let id = prompt_i64("History ID")?;
                let update = MedicalHistoryUpdate {
                    patient_id: prompt_i64_opt("Patient ID (blank keeps current)")?,
                    doctor_id: prompt_i64_opt("Doctor ID (blank keeps current)")?,
                    diagnosis: prompt_opt("Diagnosis (blank keeps current)")?,
                    treatment: prompt_opt("Treatment (blank keeps current)")?,
                    record_date: prompt_date_opt("Record date (blank keeps current)")?,
                };
                report_optional(db.update_medical_history(id, update).await, "medical history");
            }
            "5" => {
                let id = prompt_i64("History ID")?;
                report_optional(db.delete_medical_history(id).await, "medical history");
            }
            "6" => {
                let id = prompt_i64("Doctor ID")?;
                report(db.medical_history_by_doctor(id).await);
            }
            "7" => {
                let id = prompt_i64("Patient ID")?;
                report(db.medical_history_by_patient(id).await);
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn beds_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Wards and Beds ---");
        println!("1. Create ward  2. List wards  3. Provision bed  4. List beds");
        println!("5. Available beds  6. Occupied beds  7. Assign bed  8. Release bed  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let new = NewWard {
                    name: prompt("Ward name")?,
                    capacity: prompt_i64("Capacity")?,
                };
                report(db.create_ward(new).await);
            }
            "2" => report(db.list_wards().await),
            "3" => {
                let ward_id = prompt_i64("Ward ID")?;
                report(db.create_bed(ward_id).await);
            }
            "4" => report(db.list_beds().await),
            "5" => report(db.available_beds().await),
            "6" => report(db.occupied_beds().await),
            "7" => {
                let bed_id = prompt_i64("Bed ID")?;
                let patient_id = prompt_i64("Patient ID")?;
                report(db.assign_bed(bed_id, patient_id).await);
            }
            "8" => {
                let bed_id = prompt_i64("Bed ID")?;
                report(db.release_bed(bed_id).await);
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn prescriptions_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Prescriptions ---");
        println!("1. Create  2. List  3. Get  4. Search by patient  5. Search by doctor  6. Search by id  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let patient_id = prompt_i64("Patient ID")?;
                let doctor_id = prompt_i64("Doctor ID")?;
                let notes = prompt_opt("Notes")?;
                let mut details = Vec::new();
                loop {
                    details.push(NewPrescriptionDetail {
                        medication_name: prompt("Medication name")?,
                        dosage: prompt("Dosage")?,
                        frequency: prompt("Frequency")?,
                        duration: prompt("Duration")?,
                    });
                    if prompt("Add another medication? (y/n)")? != "y" {
                        break;
                    }
                }
                report(
                    db.create_prescription(NewPrescription {
                        patient_id,
                        doctor_id,
                        date_issued: None,
                        notes,
                        details,
                    })
                    .await,
                );
            }
            "2" => report(db.list_prescriptions().await),
            "3" => {
                let id = prompt_i64("Prescription ID")?;
                report_optional(db.get_prescription(id).await, "prescription");
            }
            "4" => {
                let id = prompt_i64("Patient ID")?;
                report(db.search_prescriptions(PrescriptionSearch::PatientId(id)).await);
            }
            "5" => {
                let id = prompt_i64("Doctor ID")?;
                report(db.search_prescriptions(PrescriptionSearch::DoctorId(id)).await);
            }
            "6" => {
                let id = prompt_i64("Prescription ID")?;
                report(db.search_prescriptions(PrescriptionSearch::PrescriptionId(id)).await);
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn notifications_menu(db: &HospitalDb) -> anyhow::Result<()> {
    loop {
        println!("\n--- Notifications ---");
        println!("1. Send  2. List for recipient  3. Mark read  0. Back");
        match prompt("Select")?.as_str() {
            "1" => {
                let recipient_type = prompt_recipient_type()?;
                let recipient_id = prompt_i64("Recipient ID")?;
                let message = prompt("Message")?;
                report(db.notify(recipient_type, recipient_id, &message).await);
            }
            "2" => {
                let recipient_type = prompt_recipient_type()?;
                let recipient_id = prompt_i64("Recipient ID")?;
                report(db.notifications_for(recipient_type, recipient_id).await);
            }
            "3" => {
                let id = prompt_i64("Notification ID")?;
                report_optional(db.mark_notification_read(id).await, "notification");
            }
            "0" => return Ok(()),
            _ => println!("Invalid selection."),
        }
    }
}

async fn help_menu(db: &HospitalDb, help: &HelpData) -> anyhow::Result<()> {
    loop {
        println!("\n=== Help ===");
        for (index, category) in help.questions.iter().enumerate() {
            println!("{}. {}", index + 1, category.category);
        }
        println!("0. Back");
        let choice = prompt("Select a category")?;
        if choice == "0" {
            return Ok(());
        }
        let Some(category) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| help.questions.get(n))
        else {
            println!("Invalid selection.");
            continue;
        };
        for (index, question) in category.questions.iter().enumerate() {
            println!("  {}. {}", index + 1, question.question);
        }
        println!("  0. Back");
        let choice = prompt("Select a question")?;
        if choice == "0" {
            continue;
        }
        let Some(question) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| category.questions.get(n))
        else {
            println!("Invalid selection.");
            continue;
        };
        match db.run_help_query(&question.query).await {
            Ok(output) => {
                if output.rows.is_empty() {
                    println!("No results found.");
                } else {
                    println!("{}", output.columns.join(" | "));
                    for row in &output.rows {
                        println!("{}", row.join(" | "));
                    }
                }
            }
            Err(err) => println!("{err}"),
        }
    }
}

// ===== Prompt helpers =====

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn prompt_opt(label: &str) -> anyhow::Result<Option<String>> {
    let value = prompt(label)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

fn prompt_i64(label: &str) -> anyhow::Result<i64> {
    loop {
        match prompt(label)?.parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("Please enter a number."),
        }
    }
}

fn prompt_i64_opt(label: &str) -> anyhow::Result<Option<i64>> {
    loop {
        let value = prompt(label)?;
        if value.is_empty() {
            return Ok(None);
        }
        match value.parse() {
            Ok(value) => return Ok(Some(value)),
            Err(_) => println!("Please enter a number."),
        }
    }
}

fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| {
            HospitalError::Validation(format!(
                "dates must use the format {DATE_FORMAT}, got {value:?}"
            ))
        })
}

fn prompt_date(label: &str) -> anyhow::Result<DateTime<Utc>> {
    loop {
        match parse_date(&prompt(&format!("{label} ({DATE_FORMAT})"))?) {
            Ok(value) => return Ok(value),
            Err(err) => println!("{err}"),
        }
    }
}

fn prompt_date_opt(label: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
    loop {
        let value = prompt(&format!("{label} ({DATE_FORMAT})"))?;
        if value.is_empty() {
            return Ok(None);
        }
        match parse_date(&value) {
            Ok(value) => return Ok(Some(value)),
            Err(err) => println!("{err}"),
        }
    }
}

fn prompt_status(label: &str) -> anyhow::Result<AppointmentStatus> {
    loop {
        match prompt(label)?
            .parse::<i64>()
            .map_err(|_| HospitalError::Validation("status must be a number".into()))
            .and_then(AppointmentStatus::from_code)
        {
            Ok(status) => return Ok(status),
            Err(err) => println!("{err}"),
        }
    }
}

fn prompt_status_opt(label: &str) -> anyhow::Result<Option<AppointmentStatus>> {
    loop {
        let value = prompt(label)?;
        if value.is_empty() {
            return Ok(None);
        }
        match value
            .parse::<i64>()
            .map_err(|_| HospitalError::Validation("status must be a number".into()))
            .and_then(AppointmentStatus::from_code)
        {
            Ok(status) => return Ok(Some(status)),
            Err(err) => println!("{err}"),
        }
    }
}

fn prompt_kind(label: &str) -> anyhow::Result<Option<AppointmentKind>> {
    loop {
        let value = prompt(label)?;
        if value.is_empty() {
            return Ok(None);
        }
        match AppointmentKind::parse(&value) {
            Ok(kind) => return Ok(Some(kind)),
            Err(err) => println!("{err}"),
        }
    }
}

fn prompt_recipient_type() -> anyhow::Result<RecipientType> {
    loop {
        match RecipientType::parse(&prompt("Recipient type (Doctor, Patient, Staff)")?) {
            Ok(recipient_type) => return Ok(recipient_type),
            Err(err) => println!("{err}"),
        }
    }
}

// ===== Output =====

fn report<T: Debug>(result: Result<T>) {
    match result {
        Ok(value) => println!("{value:#?}"),
        Err(err) => println!("{err}"),
    }
}

fn report_optional<T: Debug>(result: Result<Option<T>>, entity: &str) {
    match result {
        Ok(Some(value)) => println!("{value:#?}"),
        Ok(None) => println!("No such {entity}."),
        Err(err) => println!("{err}"),
    }
}

//! Entity store: a pooled SQLite handle with per-entity CRUD.
//!
//! One `HospitalDb` is passed explicitly into every operation; there is no
//! process-wide session. `get`/`update`/`delete` report an absent id as
//! `Ok(None)` rather than an error, so callers check absence explicitly.
//! Writes that embed a foreign id run through the referential guards
//! first and fail with `InvalidReference` before anything is written.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{HospitalError, Result};
use crate::models::*;

pub struct HospitalDb {
    pool: SqlitePool,
}

impl HospitalDb {
    /// Open (creating if missing) the database at `url` and initialize the
    /// schema. The pool holds a single connection: the system model is one
    /// interactive operator per process.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.initialize_schema().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS doctors (
                doctor_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                speciality TEXT NOT NULL,
                phone TEXT,
                email TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS staff (
                staff_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                email TEXT NOT NULL,
                hire_date TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS staff_shifts (
                shift_id INTEGER PRIMARY KEY AUTOINCREMENT,
                staff_id INTEGER NOT NULL REFERENCES staff(staff_id),
                shift_start TEXT NOT NULL,
                shift_end TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS patients (
                patient_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                records TEXT NOT NULL,
                phone TEXT,
                email TEXT NOT NULL,
                doctor_id INTEGER REFERENCES doctors(doctor_id),
                staff_id INTEGER REFERENCES staff(staff_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS test_records (
                record_id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES patients(patient_id),
                name TEXT,
                test_date TEXT,
                remarks TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS appointments (
                appointment_id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER REFERENCES patients(patient_id),
                doctor_id INTEGER NOT NULL REFERENCES doctors(doctor_id),
                appointment_date TEXT NOT NULL,
                status INTEGER NOT NULL,
                kind TEXT,
                speciality TEXT NOT NULL,
                notes TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS medical_history (
                history_id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES patients(patient_id),
                doctor_id INTEGER NOT NULL REFERENCES doctors(doctor_id),
                diagnosis TEXT NOT NULL,
                treatment TEXT,
                record_date TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS wards (
                ward_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                capacity INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS beds (
                bed_id INTEGER PRIMARY KEY AUTOINCREMENT,
                ward_id INTEGER NOT NULL REFERENCES wards(ward_id),
                patient_id INTEGER REFERENCES patients(patient_id),
                status TEXT NOT NULL DEFAULT 'Available',
                assigned_date TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS prescriptions (
                prescription_id INTEGER PRIMARY KEY AUTOINCREMENT,
                patient_id INTEGER NOT NULL REFERENCES patients(patient_id),
                doctor_id INTEGER NOT NULL REFERENCES doctors(doctor_id),
                date_issued TEXT NOT NULL,
                notes TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS prescription_details (
                detail_id INTEGER PRIMARY KEY AUTOINCREMENT,
                prescription_id INTEGER NOT NULL REFERENCES prescriptions(prescription_id),
                medication_name TEXT NOT NULL,
                dosage TEXT NOT NULL,
                frequency TEXT NOT NULL,
                duration TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS notifications (
                notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipient_type TEXT NOT NULL,
                recipient_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Unread',
                created_at TEXT NOT NULL,
                read_at TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ===== Referential guards =====

    async fn exists_in(&self, table: &'static str, key: &'static str, id: i64) -> Result<bool> {
        let found: Option<i64> =
            sqlx::query_scalar(&format!("SELECT 1 FROM {table} WHERE {key} = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    pub(crate) async fn ensure_doctor_exists(&self, field: &'static str, id: i64) -> Result<()> {
        if self.exists_in("doctors", "doctor_id", id).await? {
            Ok(())
        } else {
            Err(HospitalError::InvalidReference { field, id })
        }
    }

    pub(crate) async fn ensure_patient_exists(&self, field: &'static str, id: i64) -> Result<()> {
        if self.exists_in("patients", "patient_id", id).await? {
            Ok(())
        } else {
            Err(HospitalError::InvalidReference { field, id })
        }
    }

    pub(crate) async fn ensure_staff_exists(&self, field: &'static str, id: i64) -> Result<()> {
        if self.exists_in("staff", "staff_id", id).await? {
            Ok(())
        } else {
            Err(HospitalError::InvalidReference { field, id })
        }
    }

    pub(crate) async fn ensure_ward_exists(&self, field: &'static str, id: i64) -> Result<()> {
        if self.exists_in("wards", "ward_id", id).await? {
            Ok(())
        } else {
            Err(HospitalError::InvalidReference { field, id })
        }
    }

    /// Restrict-delete guard: fail when any dependent table still holds
    /// rows pointing at the entity.
    async fn ensure_no_dependents(
        &self,
        entity: &'static str,
        id: i64,
        dependents: &[(&'static str, &'static str)],
    ) -> Result<()> {
        for (table, column) in dependents {
            let count: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?"))
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            if count > 0 {
                return Err(HospitalError::ConstraintViolation(format!(
                    "cannot delete {entity} {id}: {count} dependent row(s) in {table}"
                )));
            }
        }
        Ok(())
    }

    // ===== Doctors =====

    pub async fn create_doctor(&self, new: NewDoctor) -> Result<Doctor> {
        let result = sqlx::query(
            "INSERT INTO doctors (name, speciality, phone, email) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.speciality)
        .bind(&new.phone)
        .bind(&new.email)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        info!(doctor_id = id, "doctor created");
        Ok(Doctor {
            id,
            name: new.name,
            speciality: new.speciality,
            phone: new.phone,
            email: new.email,
        })
    }

    pub async fn get_doctor(&self, id: i64) -> Result<Option<Doctor>> {
        let row = sqlx::query(
            "SELECT doctor_id, name, speciality, phone, email FROM doctors WHERE doctor_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(doctor_from_row).transpose()
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>> {
        let rows = sqlx::query(
            "SELECT doctor_id, name, speciality, phone, email FROM doctors ORDER BY doctor_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(doctor_from_row).collect()
    }

    pub async fn update_doctor(&self, id: i64, update: DoctorUpdate) -> Result<Option<Doctor>> {
        let Some(mut doctor) = self.get_doctor(id).await? else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            doctor.name = name;
        }
        if let Some(speciality) = update.speciality {
            doctor.speciality = speciality;
        }
        if let Some(phone) = update.phone {
            doctor.phone = Some(phone);
        }
        if let Some(email) = update.email {
            doctor.email = email;
        }
        let result = sqlx::query(
            "UPDATE doctors SET name = ?, speciality = ?, phone = ?, email = ? WHERE doctor_id = ?",
        )
        .bind(&doctor.name)
        .bind(&doctor.speciality)
        .bind(&doctor.phone)
        .bind(&doctor.email)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(doctor_id = id, "doctor updated");
        Ok(Some(doctor))
    }

    pub async fn delete_doctor(&self, id: i64) -> Result<Option<Doctor>> {
        let Some(doctor) = self.get_doctor(id).await? else {
            return Ok(None);
        };
        self.ensure_no_dependents(
            "doctor",
            id,
            &[
                ("patients", "doctor_id"),
                ("appointments", "doctor_id"),
                ("medical_history", "doctor_id"),
                ("prescriptions", "doctor_id"),
            ],
        )
        .await?;
        sqlx::query("DELETE FROM doctors WHERE doctor_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(doctor_id = id, "doctor deleted");
        Ok(Some(doctor))
    }

    // ===== Staff =====

    pub async fn create_staff(&self, new: NewStaff) -> Result<Staff> {
        let result = sqlx::query(
            "INSERT INTO staff (name, department, email, hire_date) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.department)
        .bind(&new.email)
        .bind(new.hire_date)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        info!(staff_id = id, "staff member created");
        Ok(Staff {
            id,
            name: new.name,
            department: new.department,
            email: new.email,
            hire_date: new.hire_date,
        })
    }

    pub async fn get_staff_member(&self, id: i64) -> Result<Option<Staff>> {
        let row = sqlx::query(
            "SELECT staff_id, name, department, email, hire_date FROM staff WHERE staff_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(staff_from_row).transpose()
    }

    pub async fn list_staff(&self) -> Result<Vec<Staff>> {
        let rows = sqlx::query(
            "SELECT staff_id, name, department, email, hire_date FROM staff ORDER BY staff_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(staff_from_row).collect()
    }

    pub async fn update_staff(&self, id: i64, update: StaffUpdate) -> Result<Option<Staff>> {
        let Some(mut staff) = self.get_staff_member(id).await? else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            staff.name = name;
        }
        if let Some(department) = update.department {
            staff.department = department;
        }
        if let Some(email) = update.email {
            staff.email = email;
        }
        if let Some(hire_date) = update.hire_date {
            staff.hire_date = hire_date;
        }
        let result = sqlx::query(
            "UPDATE staff SET name = ?, department = ?, email = ?, hire_date = ? WHERE staff_id = ?",
        )
        .bind(&staff.name)
        .bind(&staff.department)
        .bind(&staff.email)
        .bind(staff.hire_date)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(staff_id = id, "staff member updated");
        Ok(Some(staff))
    }

    pub async fn delete_staff(&self, id: i64) -> Result<Option<Staff>> {
        let Some(staff) = self.get_staff_member(id).await? else {
            return Ok(None);
        };
        self.ensure_no_dependents(
            "staff member",
            id,
            &[("patients", "staff_id"), ("staff_shifts", "staff_id")],
        )
        .await?;
        sqlx::query("DELETE FROM staff WHERE staff_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(staff_id = id, "staff member deleted");
        Ok(Some(staff))
    }

    // ===== Staff shifts =====

    pub async fn create_staff_shift(&self, new: NewStaffShift) -> Result<StaffShift> {
        self.ensure_staff_exists("staff_id", new.staff_id).await?;
        let result = sqlx::query(
            "INSERT INTO staff_shifts (staff_id, shift_start, shift_end) VALUES (?, ?, ?)",
        )
        .bind(new.staff_id)
        .bind(new.shift_start)
        .bind(new.shift_end)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        info!(shift_id = id, staff_id = new.staff_id, "staff shift created");
        Ok(StaffShift {
            id,
            staff_id: new.staff_id,
            shift_start: new.shift_start,
            shift_end: new.shift_end,
        })
    }

    pub async fn get_staff_shift(&self, id: i64) -> Result<Option<StaffShift>> {
        let row = sqlx::query(
            "SELECT shift_id, staff_id, shift_start, shift_end FROM staff_shifts WHERE shift_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(staff_shift_from_row).transpose()
    }

    pub async fn list_staff_shifts(&self) -> Result<Vec<StaffShift>> {
        let rows = sqlx::query(
            "SELECT shift_id, staff_id, shift_start, shift_end FROM staff_shifts ORDER BY shift_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(staff_shift_from_row).collect()
    }

    pub async fn staff_shifts_for(&self, staff_id: i64) -> Result<Vec<StaffShift>> {
        let rows = sqlx::query(
            "SELECT shift_id, staff_id, shift_start, shift_end FROM staff_shifts
             WHERE staff_id = ? ORDER BY shift_id",
        )
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(staff_shift_from_row).collect()
    }

    pub async fn update_staff_shift(
        &self,
        id: i64,
        update: StaffShiftUpdate,
    ) -> Result<Option<StaffShift>> {
        if let Some(staff_id) = update.staff_id {
            self.ensure_staff_exists("staff_id", staff_id).await?;
        }
        let Some(mut shift) = self.get_staff_shift(id).await? else {
            return Ok(None);
        };
        if let Some(staff_id) = update.staff_id {
            shift.staff_id = staff_id;
        }
        if let Some(start) = update.shift_start {
            shift.shift_start = start;
        }
        if let Some(end) = update.shift_end {
            shift.shift_end = end;
        }
        let result = sqlx::query(
            "UPDATE staff_shifts SET staff_id = ?, shift_start = ?, shift_end = ? WHERE shift_id = ?",
        )
        .bind(shift.staff_id)
        .bind(shift.shift_start)
        .bind(shift.shift_end)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(shift_id = id, "staff shift updated");
        Ok(Some(shift))
    }

    pub async fn delete_staff_shift(&self, id: i64) -> Result<Option<StaffShift>> {
        let Some(shift) = self.get_staff_shift(id).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM staff_shifts WHERE shift_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(shift_id = id, "staff shift deleted");
        Ok(Some(shift))
    }

    // ===== Patients =====

    pub async fn create_patient(&self, new: NewPatient) -> Result<Patient> {
        if let Some(doctor_id) = new.doctor_id {
            self.ensure_doctor_exists("doctor_id", doctor_id).await?;
        }
        if let Some(staff_id) = new.staff_id {
            self.ensure_staff_exists("staff_id", staff_id).await?;
        }
        let result = sqlx::query(
            "INSERT INTO patients (name, records, phone, email, doctor_id, staff_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.records)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(new.doctor_id)
        .bind(new.staff_id)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        info!(patient_id = id, "patient created");
        Ok(Patient {
            id,
            name: new.name,
            records: new.records,
            phone: new.phone,
            email: new.email,
            doctor_id: new.doctor_id,
            staff_id: new.staff_id,
        })
    }

    pub async fn get_patient(&self, id: i64) -> Result<Option<Patient>> {
        let row = sqlx::query(
            "SELECT patient_id, name, records, phone, email, doctor_id, staff_id
             FROM patients WHERE patient_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(patient_from_row).transpose()
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>> {
        let rows = sqlx::query(
            "SELECT patient_id, name, records, phone, email, doctor_id, staff_id
             FROM patients ORDER BY patient_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(patient_from_row).collect()
    }

    pub async fn update_patient(&self, id: i64, update: PatientUpdate) -> Result<Option<Patient>> {
        if let Some(doctor_id) = update.doctor_id {
            self.ensure_doctor_exists("doctor_id", doctor_id).await?;
        }
        if let Some(staff_id) = update.staff_id {
            self.ensure_staff_exists("staff_id", staff_id).await?;
        }
        let Some(mut patient) = self.get_patient(id).await? else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            patient.name = name;
        }
        if let Some(records) = update.records {
            patient.records = records;
        }
        if let Some(phone) = update.phone {
            patient.phone = Some(phone);
        }
        if let Some(email) = update.email {
            patient.email = email;
        }
        if let Some(doctor_id) = update.doctor_id {
            patient.doctor_id = Some(doctor_id);
        }
        if let Some(staff_id) = update.staff_id {
            patient.staff_id = Some(staff_id);
        }
        let result = sqlx::query(
            "UPDATE patients SET name = ?, records = ?, phone = ?, email = ?, doctor_id = ?, staff_id = ?
             WHERE patient_id = ?",
        )
        .bind(&patient.name)
        .bind(&patient.records)
        .bind(&patient.phone)
        .bind(&patient.email)
        .bind(patient.doctor_id)
        .bind(patient.staff_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(patient_id = id, "patient updated");
        Ok(Some(patient))
    }

    pub async fn delete_patient(&self, id: i64) -> Result<Option<Patient>> {
        let Some(patient) = self.get_patient(id).await? else {
            return Ok(None);
        };
        self.ensure_no_dependents(
            "patient",
            id,
            &[
                ("test_records", "patient_id"),
                ("appointments", "patient_id"),
                ("medical_history", "patient_id"),
                ("prescriptions", "patient_id"),
                ("beds", "patient_id"),
            ],
        )
        .await?;
        sqlx::query("DELETE FROM patients WHERE patient_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(patient_id = id, "patient deleted");
        Ok(Some(patient))
    }

    // ===== Test records =====

    pub async fn create_test_record(&self, new: NewTestRecord) -> Result<TestRecord> {
        self.ensure_patient_exists("patient_id", new.patient_id).await?;
        let result = sqlx::query(
            "INSERT INTO test_records (patient_id, name, test_date, remarks) VALUES (?, ?, ?, ?)",
        )
        .bind(new.patient_id)
        .bind(&new.name)
        .bind(new.test_date)
        .bind(&new.remarks)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        info!(record_id = id, patient_id = new.patient_id, "test record created");
        Ok(TestRecord {
            id,
            patient_id: new.patient_id,
            name: new.name,
            test_date: new.test_date,
            remarks: new.remarks,
        })
    }

    pub async fn get_test_record(&self, id: i64) -> Result<Option<TestRecord>> {
        let row = sqlx::query(
            "SELECT record_id, patient_id, name, test_date, remarks
             FROM test_records WHERE record_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(test_record_from_row).transpose()
    }

    pub async fn list_test_records(&self) -> Result<Vec<TestRecord>> {
        let rows = sqlx::query(
            "SELECT record_id, patient_id, name, test_date, remarks
             FROM test_records ORDER BY record_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(test_record_from_row).collect()
    }

    pub async fn update_test_record(
        &self,
        id: i64,
        update: TestRecordUpdate,
    ) -> Result<Option<TestRecord>> {
        let Some(mut record) = self.get_test_record(id).await? else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            record.name = Some(name);
        }
        if let Some(test_date) = update.test_date {
            record.test_date = Some(test_date);
        }
        if let Some(remarks) = update.remarks {
            record.remarks = Some(remarks);
        }
        let result = sqlx::query(
            "UPDATE test_records SET name = ?, test_date = ?, remarks = ? WHERE record_id = ?",
        )
        .bind(&record.name)
        .bind(record.test_date)
        .bind(&record.remarks)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(record_id = id, "test record updated");
        Ok(Some(record))
    }

    pub async fn delete_test_record(&self, id: i64) -> Result<Option<TestRecord>> {
        let Some(record) = self.get_test_record(id).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM test_records WHERE record_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(record_id = id, "test record deleted");
        Ok(Some(record))
    }

    // ===== Medical history =====

    pub async fn create_medical_history(&self, new: NewMedicalHistory) -> Result<MedicalHistory> {
        self.ensure_patient_exists("patient_id", new.patient_id).await?;
        self.ensure_doctor_exists("doctor_id", new.doctor_id).await?;
        let result = sqlx::query(
            "INSERT INTO medical_history (patient_id, doctor_id, diagnosis, treatment, record_date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new.patient_id)
        .bind(new.doctor_id)
        .bind(&new.diagnosis)
        .bind(&new.treatment)
        .bind(new.record_date)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        info!(history_id = id, patient_id = new.patient_id, "medical history created");
        Ok(MedicalHistory {
            id,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            diagnosis: new.diagnosis,
            treatment: new.treatment,
            record_date: new.record_date,
        })
    }

    pub async fn get_medical_history(&self, id: i64) -> Result<Option<MedicalHistory>> {
        let row = sqlx::query(
            "SELECT history_id, patient_id, doctor_id, diagnosis, treatment, record_date
             FROM medical_history WHERE history_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(medical_history_from_row).transpose()
    }

    pub async fn list_medical_history(&self) -> Result<Vec<MedicalHistory>> {
        let rows = sqlx::query(
            "SELECT history_id, patient_id, doctor_id, diagnosis, treatment, record_date
             FROM medical_history ORDER BY history_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(medical_history_from_row).collect()
    }

    pub async fn update_medical_history(
        &self,
        id: i64,
        update: MedicalHistoryUpdate,
    ) -> Result<Option<MedicalHistory>> {
        if let Some(patient_id) = update.patient_id {
            self.ensure_patient_exists("patient_id", patient_id).await?;
        }
        if let Some(doctor_id) = update.doctor_id {
            self.ensure_doctor_exists("doctor_id", doctor_id).await?;
        }
        let Some(mut history) = self.get_medical_history(id).await? else {
            return Ok(None);
        };
        if let Some(patient_id) = update.patient_id {
            history.patient_id = patient_id;
        }
        if let Some(doctor_id) = update.doctor_id {
            history.doctor_id = doctor_id;
        }
        if let Some(diagnosis) = update.diagnosis {
            history.diagnosis = diagnosis;
        }
        if let Some(treatment) = update.treatment {
            history.treatment = Some(treatment);
        }
        if let Some(record_date) = update.record_date {
            history.record_date = record_date;
        }
        let result = sqlx::query(
            "UPDATE medical_history SET patient_id = ?, doctor_id = ?, diagnosis = ?, treatment = ?, record_date = ?
             WHERE history_id = ?",
        )
        .bind(history.patient_id)
        .bind(history.doctor_id)
        .bind(&history.diagnosis)
        .bind(&history.treatment)
        .bind(history.record_date)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(history_id = id, "medical history updated");
        Ok(Some(history))
    }

    pub async fn delete_medical_history(&self, id: i64) -> Result<Option<MedicalHistory>> {
        let Some(history) = self.get_medical_history(id).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM medical_history WHERE history_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(history_id = id, "medical history deleted");
        Ok(Some(history))
    }

    pub async fn medical_history_by_doctor(&self, doctor_id: i64) -> Result<Vec<MedicalHistoryView>> {
        let rows = sqlx::query(
            "SELECT h.history_id, h.diagnosis, h.treatment, h.record_date,
                    d.name AS doctor_name, p.name AS patient_name
             FROM medical_history h
             JOIN doctors d ON h.doctor_id = d.doctor_id
             JOIN patients p ON h.patient_id = p.patient_id
             WHERE h.doctor_id = ? ORDER BY h.history_id",
        )
        .bind(doctor_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(medical_history_view_from_row).collect()
    }

    pub async fn medical_history_by_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<MedicalHistoryView>> {
        let rows = sqlx::query(
            "SELECT h.history_id, h.diagnosis, h.treatment, h.record_date,
                    d.name AS doctor_name, p.name AS patient_name
             FROM medical_history h
             JOIN doctors d ON h.doctor_id = d.doctor_id
             JOIN patients p ON h.patient_id = p.patient_id
             WHERE h.patient_id = ? ORDER BY h.history_id",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(medical_history_view_from_row).collect()
    }

    // ===== Wards =====

    pub async fn create_ward(&self, new: NewWard) -> Result<Ward> {
        let result = sqlx::query("INSERT INTO wards (name, capacity) VALUES (?, ?)")
            .bind(&new.name)
            .bind(new.capacity)
            .execute(&self.pool)
            .await?;
        let id = result.last_insert_rowid();
        info!(ward_id = id, "ward created");
        Ok(Ward {
            id,
            name: new.name,
            capacity: new.capacity,
        })
    }

    pub async fn get_ward(&self, id: i64) -> Result<Option<Ward>> {
        let row = sqlx::query("SELECT ward_id, name, capacity FROM wards WHERE ward_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(ward_from_row).transpose()
    }

    pub async fn list_wards(&self) -> Result<Vec<Ward>> {
        let rows = sqlx::query("SELECT ward_id, name, capacity FROM wards ORDER BY ward_id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(ward_from_row).collect()
    }

    pub async fn update_ward(&self, id: i64, update: WardUpdate) -> Result<Option<Ward>> {
        let Some(mut ward) = self.get_ward(id).await? else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            ward.name = name;
        }
        if let Some(capacity) = update.capacity {
            ward.capacity = capacity;
        }
        let result = sqlx::query("UPDATE wards SET name = ?, capacity = ? WHERE ward_id = ?")
            .bind(&ward.name)
            .bind(ward.capacity)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(ward_id = id, "ward updated");
        Ok(Some(ward))
    }

    pub async fn delete_ward(&self, id: i64) -> Result<Option<Ward>> {
        let Some(ward) = self.get_ward(id).await? else {
            return Ok(None);
        };
        self.ensure_no_dependents("ward", id, &[("beds", "ward_id")]).await?;
        sqlx::query("DELETE FROM wards WHERE ward_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(ward_id = id, "ward deleted");
        Ok(Some(ward))
    }

    // ===== Beds =====
    //
    // Provisioning and lookups live here; the occupancy state machine
    // (assign/release) lives in the workflow module. A provisioned bed
    // starts Available with no patient.

    pub async fn create_bed(&self, ward_id: i64) -> Result<Bed> {
        self.ensure_ward_exists("ward_id", ward_id).await?;
        let result = sqlx::query(
            "INSERT INTO beds (ward_id, patient_id, status, assigned_date)
             VALUES (?, NULL, 'Available', NULL)",
        )
        .bind(ward_id)
        .execute(&self.pool)
        .await?;
        let id = result.last_insert_rowid();
        info!(bed_id = id, ward_id, "bed provisioned");
        Ok(Bed {
            id,
            ward_id,
            patient_id: None,
            status: BedStatus::Available,
            assigned_date: None,
        })
    }

    pub async fn get_bed(&self, id: i64) -> Result<Option<Bed>> {
        let row = sqlx::query(
            "SELECT bed_id, ward_id, patient_id, status, assigned_date FROM beds WHERE bed_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(bed_from_row).transpose()
    }

    pub async fn list_beds(&self) -> Result<Vec<Bed>> {
        let rows = sqlx::query(
            "SELECT bed_id, ward_id, patient_id, status, assigned_date FROM beds ORDER BY bed_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(bed_from_row).collect()
    }

    /// Relocate a bed to another ward. Occupancy is only mutated through
    /// `assign_bed`/`release_bed`.
    pub async fn move_bed(&self, id: i64, ward_id: i64) -> Result<Option<Bed>> {
        self.ensure_ward_exists("ward_id", ward_id).await?;
        let result = sqlx::query("UPDATE beds SET ward_id = ? WHERE bed_id = ?")
            .bind(ward_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(bed_id = id, ward_id, "bed moved");
        self.get_bed(id).await
    }

    pub async fn delete_bed(&self, id: i64) -> Result<Option<Bed>> {
        let Some(bed) = self.get_bed(id).await? else {
            return Ok(None);
        };
        if bed.status == BedStatus::Occupied {
            return Err(HospitalError::ConstraintViolation(format!(
                "cannot delete bed {id}: it is occupied"
            )));
        }
        sqlx::query("DELETE FROM beds WHERE bed_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(bed_id = id, "bed deleted");
        Ok(Some(bed))
    }

    // ===== Prescriptions =====

    /// Write the prescription header and every medication line in one
    /// transaction; a failure on any line leaves nothing behind.
    pub async fn create_prescription(&self, new: NewPrescription) -> Result<Prescription> {
        if new.details.is_empty() {
            return Err(HospitalError::Validation(
                "a prescription needs at least one medication line".into(),
            ));
        }
        self.ensure_patient_exists("patient_id", new.patient_id).await?;
        self.ensure_doctor_exists("doctor_id", new.doctor_id).await?;

        let date_issued = new.date_issued.unwrap_or_else(Utc::now);
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO prescriptions (patient_id, doctor_id, date_issued, notes)
             VALUES (?, ?, ?, ?)",
        )
        .bind(new.patient_id)
        .bind(new.doctor_id)
        .bind(date_issued)
        .bind(&new.notes)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();
        for detail in &new.details {
            sqlx::query(
                "INSERT INTO prescription_details (prescription_id, medication_name, dosage, frequency, duration)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&detail.medication_name)
            .bind(&detail.dosage)
            .bind(&detail.frequency)
            .bind(&detail.duration)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(prescription_id = id, lines = new.details.len(), "prescription created");
        Ok(Prescription {
            id,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            date_issued,
            notes: new.notes,
        })
    }

    pub async fn get_prescription(&self, id: i64) -> Result<Option<Prescription>> {
        let row = sqlx::query(
            "SELECT prescription_id, patient_id, doctor_id, date_issued, notes
             FROM prescriptions WHERE prescription_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(prescription_from_row).transpose()
    }

    pub async fn list_prescriptions(&self) -> Result<Vec<Prescription>> {
        let rows = sqlx::query(
            "SELECT prescription_id, patient_id, doctor_id, date_issued, notes
             FROM prescriptions ORDER BY prescription_id",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(prescription_from_row).collect()
    }

    pub async fn prescription_details(&self, prescription_id: i64) -> Result<Vec<PrescriptionDetail>> {
        let rows = sqlx::query(
            "SELECT detail_id, prescription_id, medication_name, dosage, frequency, duration
             FROM prescription_details WHERE prescription_id = ? ORDER BY detail_id",
        )
        .bind(prescription_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(prescription_detail_from_row).collect()
    }

    pub async fn update_prescription(
        &self,
        id: i64,
        update: PrescriptionUpdate,
    ) -> Result<Option<Prescription>> {
        let Some(mut prescription) = self.get_prescription(id).await? else {
            return Ok(None);
        };
        if let Some(date_issued) = update.date_issued {
            prescription.date_issued = date_issued;
        }
        if let Some(notes) = update.notes {
            prescription.notes = Some(notes);
        }
        let result = sqlx::query(
            "UPDATE prescriptions SET date_issued = ?, notes = ? WHERE prescription_id = ?",
        )
        .bind(prescription.date_issued)
        .bind(&prescription.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(prescription_id = id, "prescription updated");
        Ok(Some(prescription))
    }

    pub async fn update_prescription_detail(
        &self,
        detail_id: i64,
        update: PrescriptionDetailUpdate,
    ) -> Result<Option<PrescriptionDetail>> {
        let row = sqlx::query(
            "SELECT detail_id, prescription_id, medication_name, dosage, frequency, duration
             FROM prescription_details WHERE detail_id = ?",
        )
        .bind(detail_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(mut detail) = row.as_ref().map(prescription_detail_from_row).transpose()? else {
            return Ok(None);
        };
        if let Some(medication_name) = update.medication_name {
            detail.medication_name = medication_name;
        }
        if let Some(dosage) = update.dosage {
            detail.dosage = dosage;
        }
        if let Some(frequency) = update.frequency {
            detail.frequency = frequency;
        }
        if let Some(duration) = update.duration {
            detail.duration = duration;
        }
        let result = sqlx::query(
            "UPDATE prescription_details SET medication_name = ?, dosage = ?, frequency = ?, duration = ?
             WHERE detail_id = ?",
        )
        .bind(&detail.medication_name)
        .bind(&detail.dosage)
        .bind(&detail.frequency)
        .bind(&detail.duration)
        .bind(detail_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(detail_id, "prescription detail updated");
        Ok(Some(detail))
    }

    pub async fn delete_prescription(&self, id: i64) -> Result<Option<Prescription>> {
        let Some(prescription) = self.get_prescription(id).await? else {
            return Ok(None);
        };
        self.ensure_no_dependents(
            "prescription",
            id,
            &[("prescription_details", "prescription_id")],
        )
        .await?;
        sqlx::query("DELETE FROM prescriptions WHERE prescription_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!(prescription_id = id, "prescription deleted");
        Ok(Some(prescription))
    }

    pub async fn delete_prescription_detail(&self, detail_id: i64) -> Result<Option<PrescriptionDetail>> {
        let row = sqlx::query(
            "SELECT detail_id, prescription_id, medication_name, dosage, frequency, duration
             FROM prescription_details WHERE detail_id = ?",
        )
        .bind(detail_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(detail) = row.as_ref().map(prescription_detail_from_row).transpose()? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM prescription_details WHERE detail_id = ?")
            .bind(detail_id)
            .execute(&self.pool)
            .await?;
        info!(detail_id, "prescription detail deleted");
        Ok(Some(detail))
    }

    /// Fixed parameterized join per search key; one row per medication
    /// line, names in place of foreign keys.
    pub async fn search_prescriptions(
        &self,
        search: PrescriptionSearch,
    ) -> Result<Vec<PrescriptionView>> {
        const BASE: &str = "SELECT r.prescription_id, d.name AS doctor_name, p.name AS patient_name,
                    r.date_issued, r.notes,
                    l.medication_name, l.dosage, l.frequency, l.duration
             FROM prescriptions r
             JOIN doctors d ON r.doctor_id = d.doctor_id
             JOIN patients p ON r.patient_id = p.patient_id
             JOIN prescription_details l ON r.prescription_id = l.prescription_id";
        let (filter, value) = match search {
            PrescriptionSearch::PatientId(id) => ("r.patient_id = ?", id),
            PrescriptionSearch::DoctorId(id) => ("r.doctor_id = ?", id),
            PrescriptionSearch::PrescriptionId(id) => ("r.prescription_id = ?", id),
        };
        let sql = format!("{BASE} WHERE {filter} ORDER BY r.prescription_id, l.detail_id");
        let rows = sqlx::query(&sql).bind(value).fetch_all(&self.pool).await?;
        rows.iter().map(prescription_view_from_row).collect()
    }
}

// ===== Row mapping =====

fn doctor_from_row(row: &SqliteRow) -> Result<Doctor> {
    Ok(Doctor {
        id: row.try_get("doctor_id")?,
        name: row.try_get("name")?,
        speciality: row.try_get("speciality")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
    })
}

fn staff_from_row(row: &SqliteRow) -> Result<Staff> {
    Ok(Staff {
        id: row.try_get("staff_id")?,
        name: row.try_get("name")?,
        department: row.try_get("department")?,
        email: row.try_get("email")?,
        hire_date: row.try_get("hire_date")?,
    })
}

fn staff_shift_from_row(row: &SqliteRow) -> Result<StaffShift> {
    Ok(StaffShift {
        id: row.try_get("shift_id")?,
        staff_id: row.try_get("staff_id")?,
        shift_start: row.try_get("shift_start")?,
        shift_end: row.try_get("shift_end")?,
    })
}

fn patient_from_row(row: &SqliteRow) -> Result<Patient> {
    Ok(Patient {
        id: row.try_get("patient_id")?,
        name: row.try_get("name")?,
        records: row.try_get("records")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        doctor_id: row.try_get("doctor_id")?,
        staff_id: row.try_get("staff_id")?,
    })
}

fn test_record_from_row(row: &SqliteRow) -> Result<TestRecord> {
    Ok(TestRecord {
        id: row.try_get("record_id")?,
        patient_id: row.try_get("patient_id")?,
        name: row.try_get("name")?,
        test_date: row.try_get("test_date")?,
        remarks: row.try_get("remarks")?,
    })
}

pub(crate) fn appointment_from_row(row: &SqliteRow) -> Result<Appointment> {
    let kind: Option<String> = row.try_get("kind")?;
    Ok(Appointment {
        id: row.try_get("appointment_id")?,
        patient_id: row.try_get("patient_id")?,
        doctor_id: row.try_get("doctor_id")?,
        date: row.try_get("appointment_date")?,
        status: AppointmentStatus::from_code(row.try_get("status")?)?,
        kind: kind.as_deref().map(AppointmentKind::parse).transpose()?,
        speciality: row.try_get("speciality")?,
        notes: row.try_get("notes")?,
    })
}

fn medical_history_from_row(row: &SqliteRow) -> Result<MedicalHistory> {
    Ok(MedicalHistory {
        id: row.try_get("history_id")?,
        patient_id: row.try_get("patient_id")?,
        doctor_id: row.try_get("doctor_id")?,
        diagnosis: row.try_get("diagnosis")?,
        treatment: row.try_get("treatment")?,
        record_date: row.try_get("record_date")?,
    })
}

fn medical_history_view_from_row(row: &SqliteRow) -> Result<MedicalHistoryView> {
    Ok(MedicalHistoryView {
        id: row.try_get("history_id")?,
        diagnosis: row.try_get("diagnosis")?,
        treatment: row.try_get("treatment")?,
        record_date: row.try_get("record_date")?,
        doctor_name: row.try_get("doctor_name")?,
        patient_name: row.try_get("patient_name")?,
    })
}

fn ward_from_row(row: &SqliteRow) -> Result<Ward> {
    Ok(Ward {
        id: row.try_get("ward_id")?,
        name: row.try_get("name")?,
        capacity: row.try_get("capacity")?,
    })
}

pub(crate) fn bed_from_row(row: &SqliteRow) -> Result<Bed> {
    let status: String = row.try_get("status")?;
    Ok(Bed {
        id: row.try_get("bed_id")?,
        ward_id: row.try_get("ward_id")?,
        patient_id: row.try_get("patient_id")?,
        status: BedStatus::parse(&status)?,
        assigned_date: row.try_get("assigned_date")?,
    })
}

fn prescription_from_row(row: &SqliteRow) -> Result<Prescription> {
    Ok(Prescription {
        id: row.try_get("prescription_id")?,
        patient_id: row.try_get("patient_id")?,
        doctor_id: row.try_get("doctor_id")?,
        date_issued: row.try_get("date_issued")?,
        notes: row.try_get("notes")?,
    })
}

fn prescription_detail_from_row(row: &SqliteRow) -> Result<PrescriptionDetail> {
    Ok(PrescriptionDetail {
        id: row.try_get("detail_id")?,
        prescription_id: row.try_get("prescription_id")?,
        medication_name: row.try_get("medication_name")?,
        dosage: row.try_get("dosage")?,
        frequency: row.try_get("frequency")?,
        duration: row.try_get("duration")?,
    })
}

fn prescription_view_from_row(row: &SqliteRow) -> Result<PrescriptionView> {
    Ok(PrescriptionView {
        prescription_id: row.try_get("prescription_id")?,
        doctor_name: row.try_get("doctor_name")?,
        patient_name: row.try_get("patient_name")?,
        date_issued: row.try_get("date_issued")?,
        notes: row.try_get("notes")?,
        medication_name: row.try_get("medication_name")?,
        dosage: row.try_get("dosage")?,
        frequency: row.try_get("frequency")?,
        duration: row.try_get("duration")?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    pub(crate) async fn memory_db() -> HospitalDb {
        HospitalDb::connect("sqlite::memory:").await.unwrap()
    }

    pub(crate) fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    pub(crate) async fn seed_doctor(db: &HospitalDb) -> Doctor {
        db.create_doctor(NewDoctor {
            name: "Aisha Rahman".into(),
            speciality: "Cardiology".into(),
            phone: Some("555-0101".into()),
            email: "a.rahman@hospital.test".into(),
        })
        .await
        .unwrap()
    }

    pub(crate) async fn seed_staff(db: &HospitalDb) -> Staff {
        db.create_staff(NewStaff {
            name: "Tomas Vega".into(),
            department: "Nursing".into(),
            email: "t.vega@hospital.test".into(),
            hire_date: ts(2023, 3, 15, 9),
        })
        .await
        .unwrap()
    }

    pub(crate) async fn seed_patient(db: &HospitalDb) -> Patient {
        db.create_patient(NewPatient {
            name: "Elena Park".into(),
            records: "No known allergies".into(),
            phone: Some("555-0199".into()),
            email: "e.park@example.test".into(),
            doctor_id: None,
            staff_id: None,
        })
        .await
        .unwrap()
    }

    pub(crate) async fn seed_ward_bed(db: &HospitalDb) -> (Ward, Bed) {
        let ward = db
            .create_ward(NewWard {
                name: "West Wing".into(),
                capacity: 4,
            })
            .await
            .unwrap();
        let bed = db.create_bed(ward.id).await.unwrap();
        (ward, bed)
    }

    #[tokio::test]
    async fn doctor_create_then_get_round_trips() {
        let db = memory_db().await;
        let created = seed_doctor(&db).await;
        let fetched = db.get_doctor(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn get_absent_doctor_is_none() {
        let db = memory_db().await;
        assert!(db.get_doctor(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_update_keeps_omitted_fields() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let updated = db
            .update_doctor(
                doctor.id,
                DoctorUpdate {
                    phone: Some("555-0202".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0202"));
        assert_eq!(updated.name, doctor.name);
        assert_eq!(updated.speciality, doctor.speciality);
        assert_eq!(updated.email, doctor.email);
    }

    #[tokio::test]
    async fn update_absent_id_is_none_and_touches_nothing() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let missing = db
            .update_doctor(
                doctor.id + 1,
                DoctorUpdate {
                    name: Some("Nobody".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
        let unchanged = db.get_doctor(doctor.id).await.unwrap().unwrap();
        assert_eq!(unchanged, doctor);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let deleted = db.delete_doctor(doctor.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, doctor.id);
        assert!(db.get_doctor(doctor.id).await.unwrap().is_none());
        assert!(db.delete_doctor(doctor.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn staff_shift_requires_existing_staff() {
        let db = memory_db().await;
        let err = db
            .create_staff_shift(NewStaffShift {
                staff_id: 42,
                shift_start: ts(2024, 11, 1, 8),
                shift_end: ts(2024, 11, 1, 16),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HospitalError::InvalidReference { field: "staff_id", id: 42 }
        ));
    }

    #[tokio::test]
    async fn staff_shifts_listed_per_staff_member() {
        let db = memory_db().await;
        let staff = seed_staff(&db).await;
        db.create_staff_shift(NewStaffShift {
            staff_id: staff.id,
            shift_start: ts(2024, 11, 1, 8),
            shift_end: ts(2024, 11, 1, 16),
        })
        .await
        .unwrap();
        db.create_staff_shift(NewStaffShift {
            staff_id: staff.id,
            shift_start: ts(2024, 11, 2, 9),
            shift_end: ts(2024, 11, 2, 17),
        })
        .await
        .unwrap();
        let shifts = db.staff_shifts_for(staff.id).await.unwrap();
        assert_eq!(shifts.len(), 2);
        assert_eq!(shifts[0].shift_start, ts(2024, 11, 1, 8));
        assert_eq!(shifts[1].shift_end, ts(2024, 11, 2, 17));
    }

    #[tokio::test]
    async fn patient_with_dangling_doctor_is_rejected() {
        let db = memory_db().await;
        let err = db
            .create_patient(NewPatient {
                name: "Ghost".into(),
                records: String::new(),
                phone: None,
                email: "ghost@example.test".into(),
                doctor_id: Some(7),
                staff_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HospitalError::InvalidReference { field: "doctor_id", id: 7 }
        ));
        assert!(db.list_patients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_requires_patient() {
        let db = memory_db().await;
        let err = db
            .create_test_record(NewTestRecord {
                patient_id: 3,
                name: Some("CBC".into()),
                test_date: Some(ts(2024, 12, 1, 10)),
                remarks: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidReference { .. }));
    }

    #[tokio::test]
    async fn medical_history_requires_both_parties_and_joins_names() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let patient = seed_patient(&db).await;

        let err = db
            .create_medical_history(NewMedicalHistory {
                patient_id: patient.id,
                doctor_id: doctor.id + 50,
                diagnosis: "Flu".into(),
                treatment: None,
                record_date: ts(2024, 10, 5, 12),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidReference { .. }));

        db.create_medical_history(NewMedicalHistory {
            patient_id: patient.id,
            doctor_id: doctor.id,
            diagnosis: "Hypertension".into(),
            treatment: Some("Lisinopril".into()),
            record_date: ts(2024, 10, 6, 12),
        })
        .await
        .unwrap();

        let by_doctor = db.medical_history_by_doctor(doctor.id).await.unwrap();
        assert_eq!(by_doctor.len(), 1);
        assert_eq!(by_doctor[0].doctor_name, doctor.name);
        assert_eq!(by_doctor[0].patient_name, patient.name);

        let by_patient = db.medical_history_by_patient(patient.id).await.unwrap();
        assert_eq!(by_patient, by_doctor);
    }

    #[tokio::test]
    async fn deleting_doctor_with_patients_is_restricted() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        db.create_patient(NewPatient {
            name: "Linked".into(),
            records: String::new(),
            phone: None,
            email: "linked@example.test".into(),
            doctor_id: Some(doctor.id),
            staff_id: None,
        })
        .await
        .unwrap();
        let err = db.delete_doctor(doctor.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::ConstraintViolation(_)));
        assert!(db.get_doctor(doctor.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_ward_with_beds_is_restricted() {
        let db = memory_db().await;
        let (ward, _bed) = seed_ward_bed(&db).await;
        let err = db.delete_ward(ward.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn prescription_needs_at_least_one_line() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let patient = seed_patient(&db).await;
        let err = db
            .create_prescription(NewPrescription {
                patient_id: patient.id,
                doctor_id: doctor.id,
                date_issued: None,
                notes: None,
                details: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::Validation(_)));
    }

    #[tokio::test]
    async fn prescription_header_and_lines_commit_together() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let patient = seed_patient(&db).await;
        let prescription = db
            .create_prescription(NewPrescription {
                patient_id: patient.id,
                doctor_id: doctor.id,
                date_issued: Some(ts(2024, 12, 2, 9)),
                notes: Some("Take with food".into()),
                details: vec![
                    NewPrescriptionDetail {
                        medication_name: "Amoxicillin".into(),
                        dosage: "500mg".into(),
                        frequency: "Twice a day".into(),
                        duration: "7 days".into(),
                    },
                    NewPrescriptionDetail {
                        medication_name: "Ibuprofen".into(),
                        dosage: "200mg".into(),
                        frequency: "As needed".into(),
                        duration: "5 days".into(),
                    },
                ],
            })
            .await
            .unwrap();

        let details = db.prescription_details(prescription.id).await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].medication_name, "Amoxicillin");

        let views = db
            .search_prescriptions(PrescriptionSearch::PatientId(patient.id))
            .await
            .unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].doctor_name, doctor.name);
        assert_eq!(views[0].patient_name, patient.name);

        let by_doctor = db
            .search_prescriptions(PrescriptionSearch::DoctorId(doctor.id))
            .await
            .unwrap();
        assert_eq!(by_doctor.len(), 2);
        let by_id = db
            .search_prescriptions(PrescriptionSearch::PrescriptionId(prescription.id))
            .await
            .unwrap();
        assert_eq!(by_id.len(), 2);
    }

    #[tokio::test]
    async fn deleting_prescription_with_lines_is_restricted() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let patient = seed_patient(&db).await;
        let prescription = db
            .create_prescription(NewPrescription {
                patient_id: patient.id,
                doctor_id: doctor.id,
                date_issued: None,
                notes: None,
                details: vec![NewPrescriptionDetail {
                    medication_name: "Metformin".into(),
                    dosage: "850mg".into(),
                    frequency: "Once a day".into(),
                    duration: "30 days".into(),
                }],
            })
            .await
            .unwrap();
        let err = db.delete_prescription(prescription.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::ConstraintViolation(_)));

        let details = db.prescription_details(prescription.id).await.unwrap();
        db.delete_prescription_detail(details[0].id).await.unwrap().unwrap();
        db.delete_prescription(prescription.id).await.unwrap().unwrap();
        assert!(db.get_prescription(prescription.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn occupied_bed_cannot_be_deleted() {
        let db = memory_db().await;
        let (_ward, bed) = seed_ward_bed(&db).await;
        let patient = seed_patient(&db).await;
        db.assign_bed(bed.id, patient.id).await.unwrap();
        let err = db.delete_bed(bed.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::ConstraintViolation(_)));
    }
}

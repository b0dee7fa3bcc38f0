//! Bed allocation, appointment lifecycle, and notification dispatch.
//!
//! These operations sit on top of the entity store and own the two state
//! machines: bed occupancy (Available/Occupied) and appointment status
//! (Open/Scheduled/Completed/Cancelled/Expired).

use std::collections::HashMap;

use chrono::Utc;
use once_cell::sync::Lazy;
use tracing::info;

use crate::error::{HospitalError, Result};
use crate::models::*;
use crate::store::{appointment_from_row, bed_from_row, HospitalDb};

/// Legal appointment transitions. Terminal states have no outgoing
/// edges; a same-status write is always accepted.
static TRANSITIONS: Lazy<HashMap<AppointmentStatus, &'static [AppointmentStatus]>> =
    Lazy::new(|| {
        use AppointmentStatus::*;
        const FROM_OPEN: &[AppointmentStatus] = &[Scheduled, Cancelled, Expired];
        const FROM_SCHEDULED: &[AppointmentStatus] = &[Completed, Cancelled, Expired];
        const TERMINAL: &[AppointmentStatus] = &[];
        HashMap::from([
            (Open, FROM_OPEN),
            (Scheduled, FROM_SCHEDULED),
            (Completed, TERMINAL),
            (Cancelled, TERMINAL),
            (Expired, TERMINAL),
        ])
    });

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    from == to || TRANSITIONS[&from].contains(&to)
}

impl HospitalDb {
    // ===== Bed allocation =====

    /// Put a patient in a bed. The Available -> Occupied edge is taken
    /// with a compare-and-swap so a second caller cannot steal a bed
    /// between the read and the write.
    pub async fn assign_bed(&self, bed_id: i64, patient_id: i64) -> Result<Bed> {
        self.ensure_patient_exists("patient_id", patient_id).await?;
        let assigned = Utc::now();
        let result = sqlx::query(
            "UPDATE beds SET status = 'Occupied', patient_id = ?, assigned_date = ?
             WHERE bed_id = ? AND status = 'Available'",
        )
        .bind(patient_id)
        .bind(assigned)
        .bind(bed_id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return match self.get_bed(bed_id).await? {
                None => Err(HospitalError::NotFound {
                    entity: "bed",
                    id: bed_id,
                }),
                Some(bed) => Err(HospitalError::InvalidState(format!(
                    "bed {bed_id} is already occupied by patient {}",
                    bed.patient_id.unwrap_or_default()
                ))),
            };
        }
        info!(bed_id, patient_id, "bed assigned");
        self.get_bed(bed_id).await?.ok_or(HospitalError::NotFound {
            entity: "bed",
            id: bed_id,
        })
    }

    /// Free a bed. Idempotent: releasing an already-available bed is a
    /// legal no-op, matching the console's unconditional release.
    pub async fn release_bed(&self, bed_id: i64) -> Result<Bed> {
        let result = sqlx::query(
            "UPDATE beds SET status = 'Available', patient_id = NULL, assigned_date = NULL
             WHERE bed_id = ?",
        )
        .bind(bed_id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(HospitalError::NotFound {
                entity: "bed",
                id: bed_id,
            });
        }
        info!(bed_id, "bed released");
        self.get_bed(bed_id).await?.ok_or(HospitalError::NotFound {
            entity: "bed",
            id: bed_id,
        })
    }

    pub async fn available_beds(&self) -> Result<Vec<Bed>> {
        self.beds_with_status(BedStatus::Available).await
    }

    pub async fn occupied_beds(&self) -> Result<Vec<Bed>> {
        self.beds_with_status(BedStatus::Occupied).await
    }

    async fn beds_with_status(&self, status: BedStatus) -> Result<Vec<Bed>> {
        let rows = sqlx::query(
            "SELECT bed_id, ward_id, patient_id, status, assigned_date
             FROM beds WHERE status = ? ORDER BY bed_id",
        )
        .bind(status.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(bed_from_row).collect()
    }

    // ===== Appointment lifecycle =====

    /// Book an appointment. The doctor's speciality is copied onto the
    /// row at creation time. A request without a patient creates an open
    /// slot and the status is forced to Open regardless of the input.
    pub async fn create_appointment(&self, new: NewAppointment) -> Result<Appointment> {
        let doctor = self.get_doctor(new.doctor_id).await?.ok_or(
            HospitalError::InvalidReference {
                field: "doctor_id",
                id: new.doctor_id,
            },
        )?;
        if let Some(patient_id) = new.patient_id {
            self.ensure_patient_exists("patient_id", patient_id).await?;
        }
        let status = if new.patient_id.is_none() {
            AppointmentStatus::Open
        } else {
            new.status
        };
        let result = sqlx::query(
            "INSERT INTO appointments (patient_id, doctor_id, appointment_date, status, kind, speciality, notes)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.patient_id)
        .bind(new.doctor_id)
        .bind(new.date)
        .bind(status.code())
        .bind(new.kind.map(AppointmentKind::as_str))
        .bind(&doctor.speciality)
        .bind(&new.notes)
        .execute(self.pool())
        .await?;
        let id = result.last_insert_rowid();
        info!(appointment_id = id, doctor_id = new.doctor_id, %status, "appointment created");
        Ok(Appointment {
            id,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            date: new.date,
            status,
            kind: new.kind,
            speciality: doctor.speciality,
            notes: new.notes,
        })
    }

    /// Partial update. The speciality snapshot is carried over from the
    /// existing row and is never recomputed, even when doctor_id changes;
    /// status changes must follow the transition table.
    pub async fn update_appointment(
        &self,
        id: i64,
        update: AppointmentUpdate,
    ) -> Result<Option<Appointment>> {
        if let Some(doctor_id) = update.doctor_id {
            self.ensure_doctor_exists("doctor_id", doctor_id).await?;
        }
        if let Some(patient_id) = update.patient_id {
            self.ensure_patient_exists("patient_id", patient_id).await?;
        }
        let Some(mut appointment) = self.get_appointment(id).await? else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            if !can_transition(appointment.status, status) {
                return Err(HospitalError::InvalidState(format!(
                    "appointment {id} cannot move from {} to {}",
                    appointment.status, status
                )));
            }
            appointment.status = status;
        }
        if let Some(patient_id) = update.patient_id {
            appointment.patient_id = Some(patient_id);
        }
        if let Some(doctor_id) = update.doctor_id {
            appointment.doctor_id = doctor_id;
        }
        if let Some(date) = update.date {
            appointment.date = date;
        }
        if let Some(kind) = update.kind {
            appointment.kind = Some(kind);
        }
        if let Some(notes) = update.notes {
            appointment.notes = Some(notes);
        }
        let result = sqlx::query(
            "UPDATE appointments SET patient_id = ?, doctor_id = ?, appointment_date = ?, status = ?, kind = ?, speciality = ?, notes = ?
             WHERE appointment_id = ?",
        )
        .bind(appointment.patient_id)
        .bind(appointment.doctor_id)
        .bind(appointment.date)
        .bind(appointment.status.code())
        .bind(appointment.kind.map(AppointmentKind::as_str))
        .bind(&appointment.speciality)
        .bind(&appointment.notes)
        .bind(id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(appointment_id = id, status = %appointment.status, "appointment updated");
        Ok(Some(appointment))
    }

    pub async fn get_appointment(&self, id: i64) -> Result<Option<Appointment>> {
        let row = sqlx::query(
            "SELECT appointment_id, patient_id, doctor_id, appointment_date, status, kind, speciality, notes
             FROM appointments WHERE appointment_id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(appointment_from_row).transpose()
    }

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(
            "SELECT appointment_id, patient_id, doctor_id, appointment_date, status, kind, speciality, notes
             FROM appointments ORDER BY appointment_id",
        )
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(appointment_from_row).collect()
    }

    pub async fn delete_appointment(&self, id: i64) -> Result<Option<Appointment>> {
        let Some(appointment) = self.get_appointment(id).await? else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM appointments WHERE appointment_id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        info!(appointment_id = id, "appointment deleted");
        Ok(Some(appointment))
    }

    /// The doctor's speciality as it is now, as opposed to the snapshot
    /// stored on the appointment. Callers pick whichever view they need.
    pub async fn current_speciality(&self, appointment_id: i64) -> Result<String> {
        let appointment =
            self.get_appointment(appointment_id)
                .await?
                .ok_or(HospitalError::NotFound {
                    entity: "appointment",
                    id: appointment_id,
                })?;
        let doctor = self.get_doctor(appointment.doctor_id).await?.ok_or(
            HospitalError::InvalidReference {
                field: "doctor_id",
                id: appointment.doctor_id,
            },
        )?;
        Ok(doctor.speciality)
    }

    pub async fn appointments_by_doctor(&self, doctor_id: i64) -> Result<Vec<AppointmentView>> {
        self.appointment_views("a.doctor_id = ?", doctor_id).await
    }

    pub async fn appointments_by_patient(&self, patient_id: i64) -> Result<Vec<AppointmentView>> {
        self.appointment_views("a.patient_id = ?", patient_id).await
    }

    pub async fn appointments_by_speciality(&self, speciality: &str) -> Result<Vec<AppointmentView>> {
        let rows = sqlx::query(&appointment_view_sql("a.speciality = ?"))
            .bind(speciality)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(appointment_view_from_row).collect()
    }

    async fn appointment_views(&self, filter: &str, id: i64) -> Result<Vec<AppointmentView>> {
        let rows = sqlx::query(&appointment_view_sql(filter))
            .bind(id)
            .fetch_all(self.pool())
            .await?;
        rows.iter().map(appointment_view_from_row).collect()
    }

    // ===== Notification dispatch =====

    /// Create an unread notification. The recipient id is checked against
    /// the table named by `recipient_type` before anything is written.
    pub async fn notify(
        &self,
        recipient_type: RecipientType,
        recipient_id: i64,
        message: &str,
    ) -> Result<Notification> {
        match recipient_type {
            RecipientType::Doctor => {
                self.ensure_doctor_exists("recipient_id", recipient_id).await?
            }
            RecipientType::Patient => {
                self.ensure_patient_exists("recipient_id", recipient_id).await?
            }
            RecipientType::Staff => {
                self.ensure_staff_exists("recipient_id", recipient_id).await?
            }
        }
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO notifications (recipient_type, recipient_id, message, status, created_at, read_at)
             VALUES (?, ?, ?, 'Unread', ?, NULL)",
        )
        .bind(recipient_type.as_str())
        .bind(recipient_id)
        .bind(message)
        .bind(created_at)
        .execute(self.pool())
        .await?;
        let id = result.last_insert_rowid();
        info!(notification_id = id, recipient = %recipient_type, recipient_id, "notification created");
        Ok(Notification {
            id,
            recipient_type,
            recipient_id,
            message: message.to_string(),
            status: NotificationStatus::Unread,
            created_at,
            read_at: None,
        })
    }

    /// Mark read. Idempotent: re-marking overwrites the read timestamp.
    pub async fn mark_notification_read(&self, id: i64) -> Result<Option<Notification>> {
        let read_at = Utc::now();
        let result = sqlx::query(
            "UPDATE notifications SET status = 'Read', read_at = ? WHERE notification_id = ?",
        )
        .bind(read_at)
        .bind(id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        info!(notification_id = id, "notification marked read");
        self.get_notification(id).await
    }

    pub async fn get_notification(&self, id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(
            "SELECT notification_id, recipient_type, recipient_id, message, status, created_at, read_at
             FROM notifications WHERE notification_id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.as_ref().map(notification_from_row).transpose()
    }

    /// All notifications for one recipient, in creation order.
    pub async fn notifications_for(
        &self,
        recipient_type: RecipientType,
        recipient_id: i64,
    ) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT notification_id, recipient_type, recipient_id, message, status, created_at, read_at
             FROM notifications WHERE recipient_type = ? AND recipient_id = ?
             ORDER BY notification_id",
        )
        .bind(recipient_type.as_str())
        .bind(recipient_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(notification_from_row).collect()
    }
}

fn appointment_view_sql(filter: &str) -> String {
    format!(
        "SELECT a.appointment_id, d.name AS doctor_name, p.name AS patient_name,
                a.appointment_date, a.status, a.kind, a.speciality, a.notes
         FROM appointments a
         JOIN doctors d ON a.doctor_id = d.doctor_id
         LEFT JOIN patients p ON a.patient_id = p.patient_id
         WHERE {filter} ORDER BY a.appointment_id"
    )
}

fn appointment_view_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<AppointmentView> {
    use sqlx::Row;
    let kind: Option<String> = row.try_get("kind")?;
    Ok(AppointmentView {
        id: row.try_get("appointment_id")?,
        doctor_name: row.try_get("doctor_name")?,
        patient_name: row.try_get("patient_name")?,
        date: row.try_get("appointment_date")?,
        status: AppointmentStatus::from_code(row.try_get("status")?)?,
        kind: kind.as_deref().map(AppointmentKind::parse).transpose()?,
        speciality: row.try_get("speciality")?,
        notes: row.try_get("notes")?,
    })
}

fn notification_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Notification> {
    use sqlx::Row;
    let recipient_type: String = row.try_get("recipient_type")?;
    let status: String = row.try_get("status")?;
    Ok(Notification {
        id: row.try_get("notification_id")?,
        recipient_type: RecipientType::parse(&recipient_type)?,
        recipient_id: row.try_get("recipient_id")?,
        message: row.try_get("message")?,
        status: NotificationStatus::parse(&status)?,
        created_at: row.try_get("created_at")?,
        read_at: row.try_get("read_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{memory_db, seed_doctor, seed_patient, seed_staff, seed_ward_bed, ts};
    use test_case::test_case;

    use AppointmentStatus::*;

    #[test_case(Open, Open => true)]
    #[test_case(Open, Scheduled => true)]
    #[test_case(Open, Completed => false)]
    #[test_case(Open, Cancelled => true)]
    #[test_case(Open, Expired => true)]
    #[test_case(Scheduled, Completed => true)]
    #[test_case(Scheduled, Cancelled => true)]
    #[test_case(Scheduled, Expired => true)]
    #[test_case(Scheduled, Open => false)]
    #[test_case(Completed, Open => false)]
    #[test_case(Completed, Scheduled => false)]
    #[test_case(Completed, Completed => true)]
    #[test_case(Cancelled, Scheduled => false)]
    #[test_case(Expired, Open => false)]
    fn transition_table(from: AppointmentStatus, to: AppointmentStatus) -> bool {
        can_transition(from, to)
    }

    fn bed_invariant_holds(bed: &Bed) -> bool {
        match bed.status {
            BedStatus::Occupied => bed.patient_id.is_some() && bed.assigned_date.is_some(),
            BedStatus::Available => bed.patient_id.is_none() && bed.assigned_date.is_none(),
        }
    }

    #[tokio::test]
    async fn bed_assign_conflict_release_scenario() {
        let db = memory_db().await;
        let (_ward, bed) = seed_ward_bed(&db).await;
        let patient_a = seed_patient(&db).await;
        let patient_b = db
            .create_patient(NewPatient {
                name: "Brianna Cole".into(),
                records: String::new(),
                phone: None,
                email: "b.cole@example.test".into(),
                doctor_id: None,
                staff_id: None,
            })
            .await
            .unwrap();

        let occupied = db.assign_bed(bed.id, patient_a.id).await.unwrap();
        assert_eq!(occupied.status, BedStatus::Occupied);
        assert_eq!(occupied.patient_id, Some(patient_a.id));
        assert!(bed_invariant_holds(&occupied));

        let err = db.assign_bed(bed.id, patient_b.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::InvalidState(_)));
        let unchanged = db.get_bed(bed.id).await.unwrap().unwrap();
        assert_eq!(unchanged.patient_id, Some(patient_a.id));
        assert!(bed_invariant_holds(&unchanged));

        let released = db.release_bed(bed.id).await.unwrap();
        assert_eq!(released.status, BedStatus::Available);
        assert_eq!(released.patient_id, None);
        assert_eq!(released.assigned_date, None);
        assert!(bed_invariant_holds(&released));
    }

    #[tokio::test]
    async fn assign_with_absent_patient_leaves_bed_unchanged() {
        let db = memory_db().await;
        let (_ward, bed) = seed_ward_bed(&db).await;
        let err = db.assign_bed(bed.id, 404).await.unwrap_err();
        assert!(matches!(
            err,
            HospitalError::InvalidReference { field: "patient_id", id: 404 }
        ));
        let unchanged = db.get_bed(bed.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, BedStatus::Available);
        assert!(bed_invariant_holds(&unchanged));
    }

    #[tokio::test]
    async fn assign_absent_bed_is_not_found() {
        let db = memory_db().await;
        let patient = seed_patient(&db).await;
        let err = db.assign_bed(77, patient.id).await.unwrap_err();
        assert!(matches!(err, HospitalError::NotFound { entity: "bed", id: 77 }));
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let db = memory_db().await;
        let (_ward, bed) = seed_ward_bed(&db).await;
        let first = db.release_bed(bed.id).await.unwrap();
        assert_eq!(first.status, BedStatus::Available);
        let second = db.release_bed(bed.id).await.unwrap();
        assert_eq!(second.status, BedStatus::Available);
        assert!(matches!(
            db.release_bed(999).await.unwrap_err(),
            HospitalError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn bed_status_filters() {
        let db = memory_db().await;
        let (ward, bed_a) = seed_ward_bed(&db).await;
        let bed_b = db.create_bed(ward.id).await.unwrap();
        let patient = seed_patient(&db).await;
        db.assign_bed(bed_a.id, patient.id).await.unwrap();

        let available = db.available_beds().await.unwrap();
        assert_eq!(available.iter().map(|b| b.id).collect::<Vec<_>>(), vec![bed_b.id]);
        let occupied = db.occupied_beds().await.unwrap();
        assert_eq!(occupied.iter().map(|b| b.id).collect::<Vec<_>>(), vec![bed_a.id]);
    }

    #[tokio::test]
    async fn open_appointment_forces_open_status() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let appointment = db
            .create_appointment(NewAppointment {
                patient_id: None,
                doctor_id: doctor.id,
                date: ts(2025, 1, 10, 14),
                status: AppointmentStatus::Scheduled,
                kind: None,
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Open);
        assert_eq!(appointment.patient_id, None);
        assert_eq!(appointment.speciality, doctor.speciality);
    }

    #[tokio::test]
    async fn speciality_is_a_creation_snapshot() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let patient = seed_patient(&db).await;
        let appointment = db
            .create_appointment(NewAppointment {
                patient_id: None,
                doctor_id: doctor.id,
                date: ts(2025, 2, 3, 10),
                status: AppointmentStatus::Open,
                kind: Some(AppointmentKind::Inperson),
                notes: None,
            })
            .await
            .unwrap();

        // Slot is claimed later, and the doctor retrains in between.
        db.update_doctor(
            doctor.id,
            DoctorUpdate {
                speciality: Some("Neurology".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = db
            .update_appointment(
                appointment.id,
                AppointmentUpdate {
                    patient_id: Some(patient.id),
                    status: Some(AppointmentStatus::Scheduled),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.patient_id, Some(patient.id));
        assert_eq!(updated.status, AppointmentStatus::Scheduled);
        assert_eq!(updated.speciality, "Cardiology");
        assert_eq!(
            db.current_speciality(appointment.id).await.unwrap(),
            "Neurology"
        );
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected_and_row_untouched() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let patient = seed_patient(&db).await;
        let appointment = db
            .create_appointment(NewAppointment {
                patient_id: Some(patient.id),
                doctor_id: doctor.id,
                date: ts(2025, 3, 1, 9),
                status: AppointmentStatus::Completed,
                kind: Some(AppointmentKind::Online),
                notes: Some("follow-up".into()),
            })
            .await
            .unwrap();

        let err = db
            .update_appointment(
                appointment.id,
                AppointmentUpdate {
                    status: Some(AppointmentStatus::Open),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::InvalidState(_)));
        let unchanged = db.get_appointment(appointment.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, AppointmentStatus::Completed);
    }

    #[tokio::test]
    async fn appointment_requires_existing_doctor() {
        let db = memory_db().await;
        let err = db
            .create_appointment(NewAppointment {
                patient_id: None,
                doctor_id: 12,
                date: ts(2025, 4, 1, 9),
                status: AppointmentStatus::Open,
                kind: None,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HospitalError::InvalidReference { field: "doctor_id", id: 12 }
        ));
    }

    #[tokio::test]
    async fn update_absent_appointment_is_none() {
        let db = memory_db().await;
        let got = db
            .update_appointment(5, AppointmentUpdate::default())
            .await
            .unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn appointment_views_join_names() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let patient = seed_patient(&db).await;
        db.create_appointment(NewAppointment {
            patient_id: Some(patient.id),
            doctor_id: doctor.id,
            date: ts(2025, 5, 20, 11),
            status: AppointmentStatus::Scheduled,
            kind: Some(AppointmentKind::Inperson),
            notes: None,
        })
        .await
        .unwrap();
        db.create_appointment(NewAppointment {
            patient_id: None,
            doctor_id: doctor.id,
            date: ts(2025, 5, 21, 11),
            status: AppointmentStatus::Open,
            kind: None,
            notes: None,
        })
        .await
        .unwrap();

        let by_doctor = db.appointments_by_doctor(doctor.id).await.unwrap();
        assert_eq!(by_doctor.len(), 2);
        assert_eq!(by_doctor[0].doctor_name, doctor.name);
        assert_eq!(by_doctor[0].patient_name.as_deref(), Some(patient.name.as_str()));
        assert_eq!(by_doctor[1].patient_name, None);

        let by_patient = db.appointments_by_patient(patient.id).await.unwrap();
        assert_eq!(by_patient.len(), 1);

        let by_speciality = db.appointments_by_speciality("Cardiology").await.unwrap();
        assert_eq!(by_speciality.len(), 2);
        assert!(db
            .appointments_by_speciality("Dermatology")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn notify_requires_a_real_recipient() {
        let db = memory_db().await;
        let err = db
            .notify(RecipientType::Patient, 5, "Your results are in")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HospitalError::InvalidReference { field: "recipient_id", id: 5 }
        ));
    }

    #[tokio::test]
    async fn notification_mark_read_is_idempotent() {
        let db = memory_db().await;
        let patient = seed_patient(&db).await;
        let created = db
            .notify(RecipientType::Patient, patient.id, "Your results are in")
            .await
            .unwrap();
        assert_eq!(created.status, NotificationStatus::Unread);
        assert!(created.read_at.is_none());

        let first = db.mark_notification_read(created.id).await.unwrap().unwrap();
        assert_eq!(first.status, NotificationStatus::Read);
        let first_read_at = first.read_at.unwrap();

        let second = db.mark_notification_read(created.id).await.unwrap().unwrap();
        assert_eq!(second.status, NotificationStatus::Read);
        assert!(second.read_at.unwrap() >= first_read_at);

        assert!(db.mark_notification_read(9000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn notifications_listed_in_creation_order() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let staff = seed_staff(&db).await;
        let first = db
            .notify(RecipientType::Doctor, doctor.id, "Schedule posted")
            .await
            .unwrap();
        let second = db
            .notify(RecipientType::Doctor, doctor.id, "Schedule amended")
            .await
            .unwrap();
        db.notify(RecipientType::Staff, staff.id, "Shift swap approved")
            .await
            .unwrap();

        let for_doctor = db
            .notifications_for(RecipientType::Doctor, doctor.id)
            .await
            .unwrap();
        assert_eq!(
            for_doctor.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
        let for_staff = db
            .notifications_for(RecipientType::Staff, staff.id)
            .await
            .unwrap();
        assert_eq!(for_staff.len(), 1);
    }
}

//! Credential checks for the console login gate.
//!
//! Passwords are stored as SHA-256 hex digests in the same database as
//! the clinical tables; the collaborator returns a role string on
//! success. Patient login matches a patient id against its email on
//! record instead of a password.

use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use sqlx::Row;
use tracing::info;

use crate::error::{HospitalError, Result};
use crate::models::Patient;
use crate::store::HospitalDb;

pub const ROLES: [&str; 3] = ["admin", "doctor", "staff"];

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

impl HospitalDb {
    /// Register a console user. Duplicate usernames surface as
    /// `ConstraintViolation` from the UNIQUE column.
    pub async fn register_user(&self, username: &str, password: &str, role: &str) -> Result<()> {
        if !ROLES.contains(&role) {
            return Err(HospitalError::Validation(format!(
                "role {role:?} is invalid; valid roles are {}",
                ROLES.join(", ")
            )));
        }
        sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(sha256_hex(password))
            .bind(role)
            .execute(self.pool())
            .await?;
        info!(username, role, "user registered");
        Ok(())
    }

    /// Check a username/password pair; the role string comes back on a
    /// match, `None` otherwise.
    pub async fn verify_login(&self, username: &str, password: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT role FROM users WHERE username = ? AND password = ?")
            .bind(username)
            .bind(sha256_hex(password))
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|r| r.get("role")))
    }

    /// Change a password after verifying the old one.
    pub async fn change_password(&self, username: &str, old: &str, new: &str) -> Result<()> {
        if self.verify_login(username, old).await?.is_none() {
            return Err(HospitalError::Validation("old password is incorrect".into()));
        }
        sqlx::query("UPDATE users SET password = ? WHERE username = ?")
            .bind(sha256_hex(new))
            .bind(username)
            .execute(self.pool())
            .await?;
        info!(username, "password changed");
        Ok(())
    }

    /// Patient self-service login: the patient id plus the email on file.
    pub async fn patient_login(&self, patient_id: i64, email: &str) -> Result<Option<Patient>> {
        let patient = self.get_patient(patient_id).await?;
        Ok(patient.filter(|p| p.email == email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{memory_db, seed_patient};

    #[tokio::test]
    async fn register_and_login() {
        let db = memory_db().await;
        db.register_user("mruiz", "s3cret", "doctor").await.unwrap();
        let role = db.verify_login("mruiz", "s3cret").await.unwrap();
        assert_eq!(role.as_deref(), Some("doctor"));
        assert!(db.verify_login("mruiz", "wrong").await.unwrap().is_none());
        assert!(db.verify_login("nobody", "s3cret").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_role_is_rejected() {
        let db = memory_db().await;
        let err = db.register_user("x", "pw", "janitor").await.unwrap_err();
        assert!(matches!(err, HospitalError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_constraint_violation() {
        let db = memory_db().await;
        db.register_user("mruiz", "one", "admin").await.unwrap();
        let err = db.register_user("mruiz", "two", "staff").await.unwrap_err();
        assert!(matches!(err, HospitalError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn change_password_checks_the_old_one() {
        let db = memory_db().await;
        db.register_user("mruiz", "old-pw", "staff").await.unwrap();
        assert!(matches!(
            db.change_password("mruiz", "bad", "new-pw").await.unwrap_err(),
            HospitalError::Validation(_)
        ));
        db.change_password("mruiz", "old-pw", "new-pw").await.unwrap();
        assert!(db.verify_login("mruiz", "old-pw").await.unwrap().is_none());
        assert_eq!(
            db.verify_login("mruiz", "new-pw").await.unwrap().as_deref(),
            Some("staff")
        );
    }

    #[tokio::test]
    async fn patient_login_matches_email_on_file() {
        let db = memory_db().await;
        let patient = seed_patient(&db).await;
        let found = db.patient_login(patient.id, &patient.email).await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(patient.id));
        assert!(db
            .patient_login(patient.id, "other@example.test")
            .await
            .unwrap()
            .is_none());
        assert!(db.patient_login(404, "x@example.test").await.unwrap().is_none());
    }
}

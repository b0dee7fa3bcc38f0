//! Help content: a static JSON tree of categories, each holding
//! question/query pairs, plus a read-only query runner for rendering the
//! answers at the console.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::warn;

use crate::error::{HospitalError, Result};
use crate::store::HospitalDb;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelpData {
    #[serde(default)]
    pub questions: Vec<HelpCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpCategory {
    pub category: String,
    #[serde(default)]
    pub questions: Vec<HelpQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpQuestion {
    pub question: String,
    pub query: String,
}

impl HelpData {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Load the help tree from disk. A missing or malformed file is not
    /// fatal; the console just shows an empty help menu.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match Self::from_json(&raw) {
                Ok(data) => data,
                Err(err) => {
                    warn!(path = %path.display(), %err, "help file is not valid JSON");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %path.display(), %err, "help file not found");
                Self::default()
            }
        }
    }
}

/// Column names plus stringified rows, ready for table rendering.
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl HospitalDb {
    /// Run one of the canned help queries. Only SELECT statements are
    /// accepted; the help file is data, not a migration channel.
    pub async fn run_help_query(&self, sql: &str) -> Result<QueryOutput> {
        if !sql.trim_start().to_ascii_lowercase().starts_with("select") {
            return Err(HospitalError::Validation(
                "help queries must be SELECT statements".into(),
            ));
        }
        let rows = sqlx::query(sql).fetch_all(self.pool()).await?;
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let mut rendered = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(row.columns().len());
            for index in 0..row.columns().len() {
                cells.push(render_cell(row, index)?);
            }
            rendered.push(cells);
        }
        Ok(QueryOutput {
            columns,
            rows: rendered,
        })
    }
}

fn render_cell(row: &SqliteRow, index: usize) -> Result<String> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok("NULL".into());
    }
    let type_name = raw.type_info().name().to_string();
    Ok(match type_name.as_str() {
        "TEXT" | "DATETIME" => row.try_get::<String, _>(index)?,
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index)?.to_string(),
        "REAL" => row.try_get::<f64, _>(index)?.to_string(),
        other => format!("<{}>", other.to_ascii_lowercase()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{memory_db, seed_doctor};

    #[test]
    fn parses_the_category_tree() {
        let raw = r#"{
            "questions": [
                {
                    "category": "Doctors",
                    "questions": [
                        {"question": "How many doctors are there?",
                         "query": "SELECT COUNT(*) AS doctors FROM doctors"}
                    ]
                }
            ]
        }"#;
        let data = HelpData::from_json(raw).unwrap();
        assert_eq!(data.questions.len(), 1);
        assert_eq!(data.questions[0].category, "Doctors");
        assert_eq!(data.questions[0].questions[0].question, "How many doctors are there?");
    }

    #[test]
    fn missing_file_degrades_to_empty_tree() {
        let data = HelpData::load(Path::new("/nonexistent/help.json"));
        assert!(data.questions.is_empty());
    }

    #[tokio::test]
    async fn runs_a_select_and_stringifies_rows() {
        let db = memory_db().await;
        let doctor = seed_doctor(&db).await;
        let out = db
            .run_help_query("SELECT doctor_id, name, phone FROM doctors")
            .await
            .unwrap();
        assert_eq!(out.columns, vec!["doctor_id", "name", "phone"]);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0][0], doctor.id.to_string());
        assert_eq!(out.rows[0][1], doctor.name);
    }

    #[tokio::test]
    async fn null_cells_render_as_null() {
        let db = memory_db().await;
        let out = db.run_help_query("SELECT NULL AS nothing").await.unwrap();
        assert_eq!(out.rows[0][0], "NULL");
    }

    #[tokio::test]
    async fn non_select_statements_are_refused() {
        let db = memory_db().await;
        let err = db
            .run_help_query("DELETE FROM doctors")
            .await
            .unwrap_err();
        assert!(matches!(err, HospitalError::Validation(_)));
    }
}

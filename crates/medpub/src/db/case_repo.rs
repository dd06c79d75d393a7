//! Case repository: owner-scoped CRUD for the `analysis_cases` table.

use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Row};

use super::{
    encode_json, format_timestamp, json_column, optional_json_column, optional_parsed_column,
    parsed_column, timestamp_column, Database, DatabaseError,
};
use crate::case::{AnalysisCase, CasePatch, CaseStatus};

const TABLE: &str = "analysis_cases";

fn case_from_row(row: &Row<'_>) -> Result<AnalysisCase, rusqlite::Error> {
    Ok(AnalysisCase {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        modality: parsed_column(row, "modality")?,
        body_region: row.get("body_region")?,
        notes: row.get("notes")?,
        image_paths: json_column(row, "image_paths")?,
        models: json_column(row, "models")?,
        tasks: json_column(row, "tasks")?,
        analysis_result: row.get("analysis_result")?,
        report_text: row.get("report_text")?,
        article_text: row.get("article_text")?,
        article_title: row.get("article_title")?,
        tone: row.get("tone")?,
        keywords: json_column(row, "keywords")?,
        citations: json_column(row, "citations")?,
        template_key: optional_parsed_column(row, "template_key")?,
        article_sections: optional_json_column(row, "article_sections")?,
        published_url: row.get("published_url")?,
        status: parsed_column(row, "status")?,
        status_before_analysis: optional_parsed_column(row, "status_before_analysis")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Listing parameters.
#[derive(Debug, Default, Clone)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new case row.
pub fn insert(db: &Database, case: &AnalysisCase) -> Result<(), DatabaseError> {
    let image_paths = encode_json("image_paths", &case.image_paths)?;
    let models = encode_json("models", &case.models)?;
    let tasks = encode_json("tasks", &case.tasks)?;
    let keywords = encode_json("keywords", &case.keywords)?;
    let citations = encode_json("citations", &case.citations)?;
    let sections = case
        .article_sections
        .as_ref()
        .map(|doc| encode_json("article_sections", doc))
        .transpose()?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO analysis_cases (id, user_id, modality, body_region, notes, image_paths,
             models, tasks, analysis_result, report_text, article_text, article_title, tone,
             keywords, citations, template_key, article_sections, published_url, status,
             status_before_analysis, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
             ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                case.id,
                case.user_id,
                case.modality.as_str(),
                case.body_region,
                case.notes,
                image_paths,
                models,
                tasks,
                case.analysis_result,
                case.report_text,
                case.article_text,
                case.article_title,
                case.tone,
                keywords,
                citations,
                case.template_key.map(|k| k.as_str()),
                sections,
                case.published_url,
                case.status.as_str(),
                case.status_before_analysis.map(|s| s.as_str()),
                format_timestamp(case.created_at),
                format_timestamp(case.updated_at),
            ],
        )?;
        Ok(())
    })
}

/// Finds a case by id, only if it belongs to `owner_id`.
pub fn find_for_owner(
    db: &Database,
    owner_id: &str,
    id: &str,
) -> Result<Option<AnalysisCase>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM analysis_cases WHERE id = ?1 AND user_id = ?2")?;
        let mut rows = stmt.query_map(params![id, owner_id], case_from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

const DEFAULT_PAGE_SIZE: u64 = 100;

/// SQLite binds integers as i64; larger page values saturate.
fn clamp_to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Lists an owner's cases, newest first, returning (rows, total_count).
pub fn list_for_owner(
    db: &Database,
    owner_id: &str,
    filter: &CaseFilter,
) -> Result<(Vec<AnalysisCase>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = vec!["user_id = ?1".to_string()];
        let mut param_values: Vec<Box<dyn ToSql>> = vec![Box::new(owner_id.to_string())];

        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.as_str()));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        let count_sql = format!("SELECT COUNT(*) FROM analysis_cases {}", where_clause);
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = clamp_to_sql(filter.limit.unwrap_or(DEFAULT_PAGE_SIZE));
        let offset = clamp_to_sql(filter.offset.unwrap_or(0));
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM analysis_cases {} ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<AnalysisCase> = stmt
            .query_map(params_ref.as_slice(), case_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Applies a partial update to an owner's case and bumps `updated_at`.
///
/// Setting the status to `analyzing` remembers the prior status in
/// `status_before_analysis` (unless already analyzing); any other status
/// clears it.
pub fn update(
    db: &Database,
    owner_id: &str,
    id: &str,
    patch: &CasePatch,
) -> Result<(), DatabaseError> {
    let mut sets: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

    fn push(
        sets: &mut Vec<String>,
        values: &mut Vec<Box<dyn ToSql>>,
        column: &str,
        value: Box<dyn ToSql>,
    ) {
        values.push(value);
        sets.push(format!("{} = ?{}", column, values.len()));
    }

    if let Some(notes) = &patch.notes {
        push(&mut sets, &mut param_values, "notes", Box::new(notes.clone()));
    }
    if let Some(paths) = &patch.image_paths {
        let encoded = encode_json("image_paths", paths)?;
        push(&mut sets, &mut param_values, "image_paths", Box::new(encoded));
    }
    if let Some(text) = &patch.analysis_result {
        push(&mut sets, &mut param_values, "analysis_result", Box::new(text.clone()));
    }
    if let Some(text) = &patch.report_text {
        push(&mut sets, &mut param_values, "report_text", Box::new(text.clone()));
    }
    if let Some(text) = &patch.article_text {
        push(&mut sets, &mut param_values, "article_text", Box::new(text.clone()));
    }
    if let Some(title) = &patch.article_title {
        push(&mut sets, &mut param_values, "article_title", Box::new(title.clone()));
    }
    if let Some(tone) = &patch.tone {
        push(&mut sets, &mut param_values, "tone", Box::new(tone.clone()));
    }
    if let Some(keywords) = &patch.keywords {
        let encoded = encode_json("keywords", keywords)?;
        push(&mut sets, &mut param_values, "keywords", Box::new(encoded));
    }
    if let Some(citations) = &patch.citations {
        let encoded = encode_json("citations", citations)?;
        push(&mut sets, &mut param_values, "citations", Box::new(encoded));
    }
    if let Some(key) = patch.template_key {
        push(&mut sets, &mut param_values, "template_key", Box::new(key.as_str()));
    }
    if let Some(doc) = &patch.article_sections {
        let encoded = encode_json("article_sections", doc)?;
        push(&mut sets, &mut param_values, "article_sections", Box::new(encoded));
    }
    if let Some(url) = &patch.published_url {
        push(&mut sets, &mut param_values, "published_url", Box::new(url.clone()));
    }
    if let Some(status) = patch.status {
        // Right-hand sides see the pre-update row, so `status` here is the old value.
        if status == CaseStatus::Analyzing {
            sets.push(
                "status_before_analysis = CASE WHEN status = 'analyzing' \
                 THEN status_before_analysis ELSE status END"
                    .to_string(),
            );
        } else {
            sets.push("status_before_analysis = NULL".to_string());
        }
        push(&mut sets, &mut param_values, "status", Box::new(status.as_str()));
    }
    push(
        &mut sets,
        &mut param_values,
        "updated_at",
        Box::new(format_timestamp(Utc::now())),
    );

    param_values.push(Box::new(id.to_string()));
    param_values.push(Box::new(owner_id.to_string()));
    let sql = format!(
        "UPDATE analysis_cases SET {} WHERE id = ?{} AND user_id = ?{}",
        sets.join(", "),
        param_values.len() - 1,
        param_values.len()
    );

    db.with_conn(|conn| {
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let changed = conn.execute(&sql, params_ref.as_slice())?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                table: TABLE,
                id: id.to_string(),
            });
        }
        Ok(())
    })
}

/// Deletes an owner's case row.
pub fn delete(db: &Database, owner_id: &str, id: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "DELETE FROM analysis_cases WHERE id = ?1 AND user_id = ?2",
            params![id, owner_id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                table: TABLE,
                id: id.to_string(),
            });
        }
        Ok(())
    })
}

/// Counts an owner's cases per status. Statuses with no cases are absent.
pub fn count_by_status(
    db: &Database,
    owner_id: &str,
) -> Result<Vec<(CaseStatus, u64)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) AS n FROM analysis_cases WHERE user_id = ?1 GROUP BY status",
        )?;
        let rows = stmt
            .query_map(params![owner_id], |row| {
                Ok((parsed_column::<CaseStatus>(row, "status")?, row.get::<_, u64>("n")?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Reverts every case that has sat in `analyzing` since before `cutoff` to
/// the status it held before analysis started (or `uploaded`). Not owner
/// scoped; returns the reverted ids.
pub fn revert_stale_analyzing(
    db: &Database,
    cutoff: DateTime<Utc>,
) -> Result<Vec<String>, DatabaseError> {
    let cutoff = format_timestamp(cutoff);
    let now = format_timestamp(Utc::now());
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id FROM analysis_cases WHERE status = 'analyzing' AND updated_at < ?1",
        )?;
        let ids = stmt
            .query_map(params![cutoff], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        for id in &ids {
            conn.execute(
                "UPDATE analysis_cases
                 SET status = COALESCE(status_before_analysis, 'uploaded'),
                     status_before_analysis = NULL,
                     updated_at = ?2
                 WHERE id = ?1 AND status = 'analyzing'",
                params![id, now],
            )?;
        }
        Ok(ids)
    })
}

//! Demo case catalogue queries.

use rusqlite::{params, Row};

use super::{
    encode_json, format_timestamp, json_column, optional_json_column, parsed_column,
    timestamp_column, Database, DatabaseError,
};
use crate::case::DemoCase;

fn demo_from_row(row: &Row<'_>) -> Result<DemoCase, rusqlite::Error> {
    Ok(DemoCase {
        id: row.get("id")?,
        title: row.get("title")?,
        modality: parsed_column(row, "modality")?,
        body_region: row.get("body_region")?,
        image_paths: json_column(row, "image_paths")?,
        analysis_result: row.get("analysis_result")?,
        report_text: row.get("report_text")?,
        article_sections: optional_json_column(row, "article_sections")?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

/// Inserts or replaces a catalogue entry.
pub fn upsert(db: &Database, demo: &DemoCase) -> Result<(), DatabaseError> {
    let image_paths = encode_json("image_paths", &demo.image_paths)?;
    let sections = demo
        .article_sections
        .as_ref()
        .map(|doc| encode_json("article_sections", doc))
        .transpose()?;

    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR REPLACE INTO demo_cases (id, title, modality, body_region, image_paths,
             analysis_result, report_text, article_sections, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                demo.id,
                demo.title,
                demo.modality.as_str(),
                demo.body_region,
                image_paths,
                demo.analysis_result,
                demo.report_text,
                sections,
                format_timestamp(demo.created_at),
            ],
        )?;
        Ok(())
    })
}

/// All catalogue entries, newest first.
pub fn list(db: &Database) -> Result<Vec<DemoCase>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM demo_cases ORDER BY created_at DESC")?;
        let rows = stmt
            .query_map([], demo_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn find(db: &Database, id: &str) -> Result<Option<DemoCase>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM demo_cases WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], demo_from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

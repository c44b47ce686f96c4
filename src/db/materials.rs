//! Source materials that cards can reference

use rusqlite::{params, params_from_iter, Connection, Result, Row};
use rusqlite::types::Value;

use super::{column_ts, fmt_ts};
use crate::domain::Material;

pub fn insert_material(conn: &Connection, material: &Material) -> Result<i64> {
    conn.execute(
        "INSERT INTO materials (owner_id, content, tag, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            material.owner_id,
            material.content,
            material.tag,
            fmt_ts(material.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const MATERIAL_COLUMNS: &str = "id, owner_id, content, tag, created_at";

/// Owner-scoped material search: optional exact tag and a case-insensitive
/// substring of the content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialFilter {
    pub owner_id: String,
    pub tag: Option<String>,
    pub keyword: Option<String>,
}

impl MaterialFilter {
    pub fn owned_by(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            ..Self::default()
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn containing(mut self, keyword: &str) -> Self {
        self.keyword = Some(keyword.to_string());
        self
    }

    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses = vec!["owner_id = ?"];
        let mut params = vec![Value::Text(self.owner_id.clone())];

        if let Some(tag) = &self.tag {
            clauses.push("tag = ?");
            params.push(Value::Text(tag.clone()));
        }
        if let Some(keyword) = &self.keyword {
            clauses.push("content LIKE ? ESCAPE '\\'");
            params.push(Value::Text(format!("%{}%", escape_like(keyword))));
        }

        (clauses.join(" AND "), params)
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// One page of matching materials, newest first.
pub fn list_materials(
    conn: &Connection,
    filter: &MaterialFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Material>> {
    let (clause, mut values) = filter.to_sql();
    let query = format!(
        "SELECT {} FROM materials WHERE {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        MATERIAL_COLUMNS, clause
    );
    values.push(Value::Integer(limit));
    values.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&query)?;
    let materials = stmt
        .query_map(params_from_iter(values.iter()), |row| row_to_material(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(materials)
}

pub fn count_materials(conn: &Connection, filter: &MaterialFilter) -> Result<i64> {
    let (clause, values) = filter.to_sql();
    let query = format!("SELECT COUNT(*) FROM materials WHERE {}", clause);
    conn.query_row(&query, params_from_iter(values.iter()), |row| row.get(0))
}

pub fn get_material(conn: &Connection, id: i64, owner_id: &str) -> Result<Option<Material>> {
    let query = format!(
        "SELECT {} FROM materials WHERE id = ?1 AND owner_id = ?2",
        MATERIAL_COLUMNS
    );
    let mut stmt = conn.prepare(&query)?;

    let mut rows = stmt.query(params![id, owner_id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_material(row)?))
    } else {
        Ok(None)
    }
}

pub fn update_material(
    conn: &Connection,
    id: i64,
    owner_id: &str,
    content: &str,
    tag: Option<&str>,
) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE materials SET content = ?1, tag = ?2 WHERE id = ?3 AND owner_id = ?4",
        params![content, tag, id, owner_id],
    )?;
    Ok(updated == 1)
}

/// Cards keep pointing at a deleted material; lookups just stop finding it.
pub fn delete_material(conn: &Connection, id: i64, owner_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM materials WHERE id = ?1 AND owner_id = ?2",
        params![id, owner_id],
    )?;
    Ok(deleted == 1)
}

/// Bulk delete. Unknown ids and other owners' rows are skipped.
pub fn delete_materials(conn: &Connection, owner_id: &str, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let query = format!(
        "DELETE FROM materials WHERE owner_id = ? AND id IN ({})",
        placeholders
    );
    conn.execute(&query, params_from_iter(owner_values(owner_id, ids).iter()))
}

/// Distinct tags in use by an owner, sorted. Untagged rows are skipped.
pub fn list_material_tags(conn: &Connection, owner_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT DISTINCT tag FROM materials
    WHERE owner_id = ?1 AND tag IS NOT NULL
    ORDER BY tag ASC
    "#,
    )?;
    let tags = stmt
        .query_map(params![owner_id], |row| row.get(0))?
        .collect::<Result<Vec<String>>>()?;
    Ok(tags)
}

fn owner_values(owner_id: &str, ids: &[i64]) -> Vec<Value> {
    let mut values = vec![Value::Text(owner_id.to_string())];
    values.extend(ids.iter().map(|id| Value::Integer(*id)));
    values
}

/// Batch lookup by id. Unknown ids and other owners' rows are skipped.
pub fn find_materials_by_ids(conn: &Connection, owner_id: &str, ids: &[i64]) -> Result<Vec<Material>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let query = format!(
        "SELECT {} FROM materials WHERE owner_id = ? AND id IN ({})",
        MATERIAL_COLUMNS, placeholders
    );

    let mut stmt = conn.prepare(&query)?;
    let materials = stmt
        .query_map(params_from_iter(owner_values(owner_id, ids).iter()), |row| {
            row_to_material(row)
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(materials)
}

fn row_to_material(row: &Row) -> Result<Material> {
    Ok(Material {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        content: row.get(2)?,
        tag: row.get(3)?,
        created_at: column_ts(row, 4)?,
    })
}

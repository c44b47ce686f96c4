//! Source materials cards can be generated from.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::config::MATERIALS_PAGE_SIZE;
use crate::db::{self, MaterialFilter};
use crate::domain::Material;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialPage {
    pub materials: Vec<Material>,
    pub pagination: Pagination,
}

/// Listing parameters. Blank strings count as absent; pages start at 1.
#[derive(Debug, Clone, Default)]
pub struct MaterialSearch<'a> {
    pub keyword: Option<&'a str>,
    pub tag: Option<&'a str>,
    pub page: Option<i64>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn require_content(content: &str) -> ServiceResult<()> {
    if content.trim().is_empty() {
        return Err(ServiceError::InvalidArgument("content must not be blank".to_string()));
    }
    Ok(())
}

fn not_found(material_id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Material {} not found", material_id))
}

pub fn create_material(
    conn: &Connection,
    owner_id: &str,
    content: &str,
    tag: Option<&str>,
    now: DateTime<Utc>,
) -> ServiceResult<Material> {
    require_content(content)?;

    // Blank tags are stored as untagged
    let mut material = Material {
        id: 0,
        owner_id: owner_id.to_string(),
        content: content.to_string(),
        tag: non_blank(tag).map(str::to_string),
        created_at: now,
    };
    material.id = db::insert_material(conn, &material)?;
    tracing::debug!("Created material {} for {}", material.id, owner_id);
    Ok(material)
}

pub fn list_materials(
    conn: &Connection,
    owner_id: &str,
    search: &MaterialSearch,
) -> ServiceResult<MaterialPage> {
    let page = search.page.unwrap_or(1);
    if page < 1 {
        return Err(ServiceError::InvalidArgument(format!("Invalid page {}", page)));
    }

    let mut filter = MaterialFilter::owned_by(owner_id);
    if let Some(tag) = non_blank(search.tag) {
        filter = filter.with_tag(tag);
    }
    if let Some(keyword) = non_blank(search.keyword) {
        filter = filter.containing(keyword);
    }

    let limit = MATERIALS_PAGE_SIZE;
    let total = db::count_materials(conn, &filter)?;
    let offset = (page - 1).saturating_mul(limit);
    let materials = db::list_materials(conn, &filter, limit, offset)?;

    Ok(MaterialPage {
        materials,
        pagination: Pagination {
            total,
            total_pages: (total + limit - 1) / limit,
            current_page: page,
            limit,
        },
    })
}

pub fn update_material(
    conn: &Connection,
    owner_id: &str,
    material_id: i64,
    content: &str,
    tag: Option<&str>,
) -> ServiceResult<Material> {
    require_content(content)?;

    if !db::update_material(conn, material_id, owner_id, content, non_blank(tag))? {
        return Err(not_found(material_id));
    }
    db::get_material(conn, material_id, owner_id)?.ok_or_else(|| not_found(material_id))
}

pub fn delete_material(conn: &Connection, owner_id: &str, material_id: i64) -> ServiceResult<()> {
    if !db::delete_material(conn, material_id, owner_id)? {
        return Err(not_found(material_id));
    }
    tracing::debug!("Deleted material {} for {}", material_id, owner_id);
    Ok(())
}

/// Delete several materials at once. Ids the caller does not own are
/// skipped and not counted.
pub fn delete_materials(
    conn: &Connection,
    owner_id: &str,
    material_ids: &[i64],
) -> ServiceResult<usize> {
    if material_ids.is_empty() {
        return Err(ServiceError::InvalidArgument("No material ids given".to_string()));
    }
    let deleted = db::delete_materials(conn, owner_id, material_ids)?;
    tracing::debug!("Deleted {} materials for {}", deleted, owner_id);
    Ok(deleted)
}

pub fn list_tags(conn: &Connection, owner_id: &str) -> ServiceResult<Vec<String>> {
    Ok(db::list_material_tags(conn, owner_id)?)
}

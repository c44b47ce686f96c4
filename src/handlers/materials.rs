use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::json_body;
use crate::auth::AuthContext;
use crate::db;
use crate::domain::Material;
use crate::error::ServiceResult;
use crate::services::materials::{self, MaterialPage, MaterialSearch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MaterialQuery {
  pub tag: Option<String>,
  pub keyword: Option<String>,
  pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMaterialRequest {
  pub content: String,
  #[serde(default)]
  pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMaterialRequest {
  pub content: String,
  #[serde(default)]
  pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMaterialsRequest {
  pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMaterialsResponse {
  pub deleted_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TagsResponse {
  pub tags: Vec<String>,
}

/// GET /api/materials?tag=&keyword=&page=
pub async fn list_materials(
  auth: AuthContext,
  State(state): State<AppState>,
  Query(query): Query<MaterialQuery>,
) -> ServiceResult<Json<MaterialPage>> {
  let search = MaterialSearch {
    keyword: query.keyword.as_deref(),
    tag: query.tag.as_deref(),
    page: query.page,
  };
  let conn = db::try_lock(&state.db)?;
  Ok(Json(materials::list_materials(&conn, &auth.user_id, &search)?))
}

/// GET /api/materials/tags
pub async fn list_material_tags(
  auth: AuthContext,
  State(state): State<AppState>,
) -> ServiceResult<Json<TagsResponse>> {
  let conn = db::try_lock(&state.db)?;
  let tags = materials::list_tags(&conn, &auth.user_id)?;
  Ok(Json(TagsResponse { tags }))
}

/// POST /api/materials
pub async fn create_material(
  auth: AuthContext,
  State(state): State<AppState>,
  payload: Result<Json<CreateMaterialRequest>, JsonRejection>,
) -> ServiceResult<(StatusCode, Json<Material>)> {
  let request = json_body(payload)?;
  let conn = db::try_lock(&state.db)?;
  let material = materials::create_material(
    &conn,
    &auth.user_id,
    &request.content,
    request.tag.as_deref(),
    Utc::now(),
  )?;
  Ok((StatusCode::CREATED, Json(material)))
}

/// PUT /api/materials/{id}
pub async fn update_material(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(material_id): Path<i64>,
  payload: Result<Json<UpdateMaterialRequest>, JsonRejection>,
) -> ServiceResult<Json<Material>> {
  let request = json_body(payload)?;
  let conn = db::try_lock(&state.db)?;
  let material = materials::update_material(
    &conn,
    &auth.user_id,
    material_id,
    &request.content,
    request.tag.as_deref(),
  )?;
  Ok(Json(material))
}

/// DELETE /api/materials/{id}
pub async fn delete_material(
  auth: AuthContext,
  State(state): State<AppState>,
  Path(material_id): Path<i64>,
) -> ServiceResult<StatusCode> {
  let conn = db::try_lock(&state.db)?;
  materials::delete_material(&conn, &auth.user_id, material_id)?;
  Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/materials
pub async fn delete_materials(
  auth: AuthContext,
  State(state): State<AppState>,
  payload: Result<Json<DeleteMaterialsRequest>, JsonRejection>,
) -> ServiceResult<Json<DeleteMaterialsResponse>> {
  let request = json_body(payload)?;
  let conn = db::try_lock(&state.db)?;
  let deleted_count = materials::delete_materials(&conn, &auth.user_id, &request.ids)?;
  Ok(Json(DeleteMaterialsResponse { deleted_count }))
}

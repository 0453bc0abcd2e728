use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::catalog;
use crate::db::{DbCategory, DbSection};
use crate::listing::{self, IMAGE_URL_COLUMN, Ident};
use crate::middleware::session::{self, FlashMessage, take_flashes};
use crate::storage::gs_to_public;
use crate::{GalleryError, router::GalleryState};

#[derive(Debug, Serialize)]
pub struct SectionsView {
    pub username: Option<String>,
    pub flashes: Vec<FlashMessage>,
    pub sections: Vec<DbSection>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesView {
    pub section_id: i64,
    pub categories: Vec<DbCategory>,
}

#[derive(Debug, Serialize)]
pub struct ItemsView {
    pub category_id: i64,
    pub category: &'static str,
    pub table_name: String,
    pub columns: Vec<String>,
    pub items: Vec<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub table_name: String,
    pub item: Map<String, Value>,
}

/// GET /sections. Also where most redirects land, so it drains flashes.
pub async fn show_sections(
    State(state): State<GalleryState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, GalleryError> {
    let sections = state.storage.list_sections().await?;
    let username = session::session_user(&jar).map(|u| u.username);
    let (jar, flashes) = take_flashes(jar);
    Ok((
        jar,
        Json(SectionsView {
            username,
            flashes,
            sections,
        }),
    ))
}

/// GET /categories/{section_id}; an unknown section simply has no categories.
pub async fn show_categories(
    State(state): State<GalleryState>,
    Path(section_id): Path<i64>,
) -> Result<Json<CategoriesView>, GalleryError> {
    let categories = state.storage.categories_in_section(section_id).await?;
    Ok(Json(CategoriesView {
        section_id,
        categories,
    }))
}

/// GET /items/{category_id} -> 404 for ids outside the registry.
pub async fn show_items(
    State(state): State<GalleryState>,
    Path(category_id): Path<i64>,
) -> Result<Json<ItemsView>, GalleryError> {
    let category = catalog::category(category_id)?;
    let table = Ident::parse(category.table)?;
    let page = listing::list_listings(state.storage.pool(), &table).await?;
    Ok(Json(ItemsView {
        category_id,
        category: category.name,
        table_name: page.table,
        columns: page.columns,
        items: page.items.into_iter().map(publicise_image).collect(),
    }))
}

/// GET /item/{table}/{item_id}. The table must be a registry table.
pub async fn item_detail(
    State(state): State<GalleryState>,
    Path((table_name, item_id)): Path<(String, i64)>,
) -> Result<Json<ItemView>, GalleryError> {
    let category = catalog::category_for_table(&table_name)?;
    let table = Ident::parse(category.table)?;
    let item = listing::get_listing(state.storage.pool(), &table, item_id)
        .await?
        .ok_or_else(|| GalleryError::ListingNotFound {
            table: category.table.to_string(),
            id: item_id,
        })?;
    Ok(Json(ItemView {
        table_name: category.table.to_string(),
        item: publicise_image(item),
    }))
}

fn publicise_image(mut row: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::String(url)) = row.get_mut(IMAGE_URL_COLUMN) {
        *url = gs_to_public(url);
    }
    row
}

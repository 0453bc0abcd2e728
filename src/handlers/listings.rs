use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Serialize;
use tracing::{info, warn};

use crate::catalog;
use crate::listing::{self, Attributes, Ident};
use crate::middleware::session::{CurrentUser, FlashLevel, FlashMessage, push_flash, take_flashes};
use crate::storage::{allowed_file, content_type_for, object_name};
use crate::{GalleryError, router::GalleryState};

pub const CATEGORY_FIELD: &str = "category_id";
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct CategoryForm {
    pub id: i64,
    pub name: String,
    pub attributes: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct CreateFormView {
    pub username: String,
    pub flashes: Vec<FlashMessage>,
    pub allow_new_attributes: bool,
    pub categories: Vec<CategoryForm>,
}

/// Everything a create form posted, before validation.
#[derive(Debug, Default)]
pub struct ListingSubmission {
    pub category_id: Option<String>,
    pub fields: Vec<(String, String)>,
    pub image: Option<UploadedImage>,
}

#[derive(Debug)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Bytes,
}

impl ListingSubmission {
    pub async fn read(mut multipart: Multipart) -> Result<Self, GalleryError> {
        let mut submission = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == IMAGE_FIELD {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if !filename.is_empty() {
                    submission.image = Some(UploadedImage { filename, bytes });
                }
                continue;
            }
            let value = field.text().await?;
            if name == CATEGORY_FIELD {
                submission.category_id = Some(value);
            } else {
                submission.fields.push((name, value));
            }
        }
        Ok(submission)
    }
}

/// GET /create -> categories with the attributes each accepts.
pub async fn create_form(
    CurrentUser(user): CurrentUser,
    State(state): State<GalleryState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, GalleryError> {
    let categories = state
        .storage
        .list_categories()
        .await?
        .into_iter()
        .map(|c| CategoryForm {
            attributes: catalog::category(c.id)
                .map(|known| known.known_attributes())
                .unwrap_or_default(),
            id: c.id,
            name: c.name,
        })
        .collect();
    let (jar, flashes) = take_flashes(jar);
    Ok((
        jar,
        Json(CreateFormView {
            username: user.username,
            flashes,
            allow_new_attributes: state.allow_new_attributes,
            categories,
        }),
    ))
}

/// POST /create (multipart). Validation problems come back as flash
/// messages on the form; storage and database failures are server errors.
pub async fn create_listing(
    CurrentUser(user): CurrentUser,
    State(state): State<GalleryState>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Result<Response, GalleryError> {
    let submission = ListingSubmission::read(multipart).await?;
    let secure = state.secure_cookies;

    match create(&state, submission).await {
        Ok((table, id)) => {
            info!(user_id = user.id, table = %table, listing_id = id, "listing created");
            let jar = push_flash(jar, FlashLevel::Success, "Item listed successfully!", secure);
            Ok((jar, Redirect::to("/index")).into_response())
        }
        Err(e) => match rejection_message(&e) {
            Some(message) => {
                warn!(user_id = user.id, error = %e, "listing rejected");
                let jar = push_flash(jar, FlashLevel::Error, message, secure);
                Ok((jar, Redirect::to("/create")).into_response())
            }
            None => Err(e),
        },
    }
}

async fn create(
    state: &GalleryState,
    submission: ListingSubmission,
) -> Result<(&'static str, i64), GalleryError> {
    let category_id = submission
        .category_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .ok_or_else(|| GalleryError::InvalidForm(CATEGORY_FIELD.to_string()))?;
    let category = catalog::category(category_id)?;
    let table = Ident::parse(category.table)?;

    let attributes = Attributes::from_prefixed_fields(submission.fields)?;
    if attributes.is_empty() {
        return Err(GalleryError::NoAttributes);
    }

    let image = match submission.image {
        // The allow-list applies to the stored object name.
        Some(image) => {
            let name = object_name(&image.filename)
                .filter(|name| allowed_file(name))
                .ok_or_else(|| GalleryError::DisallowedFileType(image.filename.clone()))?;
            Some((name, image))
        }
        None => None,
    };

    if state.allow_new_attributes {
        state
            .schema
            .ensure_columns(table.clone(), attributes.names())
            .await?;
    } else if let Some((name, _)) = attributes.iter().find(|(n, _)| !category.accepts(n.as_str())) {
        return Err(GalleryError::UnknownAttribute {
            table: category.table.to_string(),
            attribute: name.as_str().to_string(),
        });
    }

    let image_url = match image {
        Some((name, image)) => {
            let url = state
                .objects
                .upload(image.bytes, &name, content_type_for(&name))
                .await?;
            Some(url)
        }
        None => None,
    };

    let id = listing::insert_listing(
        state.storage.pool(),
        &table,
        &attributes,
        image_url.as_ref().map(|u| u.as_str()),
    )
    .await?;
    Ok((category.table, id))
}

/// The flash text for errors the user can fix by editing the form.
fn rejection_message(err: &GalleryError) -> Option<String> {
    match err {
        GalleryError::CategoryNotFound(_) | GalleryError::InvalidForm(_) => {
            Some("Invalid category selected.".to_string())
        }
        GalleryError::NoAttributes => Some("No attributes provided.".to_string()),
        GalleryError::InvalidIdentifier(name) => Some(format!("Invalid attribute name: {name}")),
        GalleryError::UnknownAttribute { attribute, .. } => {
            Some(format!("Unknown attribute: {attribute}"))
        }
        GalleryError::DisallowedFileType(_) => Some("File type not allowed.".to_string()),
        _ => None,
    }
}

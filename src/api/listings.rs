use axum::{
    extract::{rejection::PathRejection, Multipart, Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::api::middleware::CurrentUser;
use crate::api::state::AppState;
use crate::db::Listing;
use crate::error::AppError;
use crate::services::{CreateListing, ImageUpload, ListingService};

pub const CATEGORIES: [&str; 7] = [
    "Textbooks",
    "Furniture",
    "Electronics",
    "Clothing",
    "Tickets",
    "Housing",
    "Other",
];

/// GET /listings
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(ListingService::list(&state.db).await?))
}

/// GET /listings/:id
pub async fn get(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Listing>, AppError> {
    let Path(id) = id?;
    Ok(Json(ListingService::get(&state.db, id).await?))
}

/// POST /listings (requires auth, multipart form)
pub async fn create(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<Json<Listing>, AppError> {
    let input = read_listing_form(multipart).await?;
    let listing = ListingService::create(&state.db, state.images.as_ref(), input, &user).await?;
    Ok(Json(listing))
}

/// DELETE /listings/:id (requires auth, must be owner)
pub async fn remove(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    ListingService::delete(&state.db, state.images.as_ref(), id, &user).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}

/// GET /categories
pub async fn categories() -> Json<[&'static str; 7]> {
    Json(CATEGORIES)
}

async fn read_listing_form(mut multipart: Multipart) -> Result<CreateListing, AppError> {
    let mut title = None;
    let mut price = None;
    let mut input = CreateListing::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "title" => title = Some(field.text().await?),
            "description" => input.description = Some(field.text().await?),
            "category" => input.category = Some(field.text().await?),
            "price" => {
                let raw = field.text().await?;
                let parsed = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| AppError::Validation(format!("Invalid price: {:?}", raw)))?;
                price = Some(parsed);
            }
            "image" => {
                let filename = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await?;

                // Browsers send an empty part when no file was picked
                let picked = filename.as_deref().is_some_and(|f| !f.is_empty()) || !data.is_empty();
                if picked {
                    input.image = Some(ImageUpload {
                        filename,
                        content_type,
                        data,
                    });
                }
            }
            other => tracing::debug!("Ignoring unexpected form field {:?}", other),
        }
    }

    input.title = title.ok_or_else(|| AppError::Validation("Missing field: title".to_string()))?;
    input.price = price.ok_or_else(|| AppError::Validation("Missing field: price".to_string()))?;

    Ok(input)
}

use axum::body::Bytes;
use sqlx::{Pool, Sqlite};

use crate::db::{Listing, ListingRepository, NewListing, User};
use crate::error::AppError;
use crate::storage::{file_extension, ImageStore};

pub const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl ImageUpload {
    fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("image/"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateListing {
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub image: Option<ImageUpload>,
}

pub struct ListingService;

impl ListingService {
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<Listing>, AppError> {
        ListingRepository::list_recent(pool).await
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Listing, AppError> {
        ListingRepository::get_by_id(pool, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        pool: &Pool<Sqlite>,
        images: &dyn ImageStore,
        input: CreateListing,
        owner: &User,
    ) -> Result<Listing, AppError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title must not be empty".to_string()));
        }
        if !input.price.is_finite() || input.price < 0.0 {
            return Err(AppError::Validation(
                "Price must be a non-negative number".to_string(),
            ));
        }

        // Reject bad media before anything touches the store
        if let Some(image) = &input.image {
            if !image.is_image() {
                return Err(AppError::InvalidMediaType);
            }
        }

        let image_url = match &input.image {
            Some(image) => {
                let extension = image.filename.as_deref().and_then(file_extension);
                Some(images.save(extension.as_deref(), &image.data).await?)
            }
            None => None,
        };

        let category = input
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let new = NewListing {
            title: title.to_string(),
            description: input.description,
            price: input.price,
            category,
            image_url: image_url.clone(),
            user_id: owner.id,
        };

        match ListingRepository::create(pool, new).await {
            Ok(listing) => {
                tracing::info!(listing_id = listing.id, user_id = owner.id, "Listing created");
                Ok(listing)
            }
            Err(e) => {
                // Don't leave an orphaned upload behind a failed insert
                if let Some(url) = image_url {
                    if let Err(cleanup) = images.remove(&url).await {
                        tracing::warn!("Failed to clean up {} after insert error: {}", url, cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    /// Delete a listing owned by `actor`, along with its image
    pub async fn delete(
        pool: &Pool<Sqlite>,
        images: &dyn ImageStore,
        id: i64,
        actor: &User,
    ) -> Result<(), AppError> {
        let listing = Self::get(pool, id).await?;

        if listing.user_id != actor.id {
            tracing::warn!(
                listing_id = id,
                owner_id = listing.user_id,
                user_id = actor.id,
                "Refusing to delete listing owned by another user"
            );
            return Err(AppError::Forbidden);
        }

        if let Some(url) = &listing.image_url {
            images.remove(url).await?;
        }

        if !ListingRepository::delete_owned(pool, id, actor.id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(listing_id = id, user_id = actor.id, "Listing deleted");
        Ok(())
    }
}

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::db::models::{Listing, NewListing};
use crate::error::AppError;

pub struct ListingRepository;

impl ListingRepository {
    pub async fn create(pool: &Pool<Sqlite>, new: NewListing) -> Result<Listing, AppError> {
        let created_at = Utc::now();

        let listing = sqlx::query_as::<_, Listing>(
            r#"
INSERT INTO listings (title, description, price, category, image_url, user_id, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.category)
        .bind(&new.image_url)
        .bind(new.user_id)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(listing)
    }

    /// All listings, newest first. Rows created within the same clock tick
    /// fall back to insertion order via the autoincrement id.
    pub async fn list_recent(pool: &Pool<Sqlite>) -> Result<Vec<Listing>, AppError> {
        let listings = sqlx::query_as::<_, Listing>(
            "SELECT * FROM listings ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await?;

        Ok(listings)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Listing>, AppError> {
        let listing = sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(listing)
    }

    /// Delete a listing only if it is still owned by `user_id`.
    /// Returns whether a row was removed.
    pub async fn delete_owned(
        pool: &Pool<Sqlite>,
        id: i64,
        user_id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::storage::ImageStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    /// Also decides which directory the router serves uploads from
    pub images: Arc<dyn ImageStore>,
    pub config: Arc<Config>,
}

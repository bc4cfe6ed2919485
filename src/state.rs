use std::sync::Arc;

use crate::config::Config;
use crate::database::UserStore;

/// Shared handler state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, config: Config) -> Self {
        Self {
            users,
            config: Arc::new(config),
        }
    }
}

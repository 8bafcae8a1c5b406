pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::notifier::ChangeNotifier;

pub use error::SchedulingError;
pub use router::scheduling_routes;

/// Shared per-process state: configuration plus the long-lived change
/// notifier (broadcast channels must outlive individual requests).
pub struct SchedulingState {
    pub config: AppConfig,
    pub notifier: Arc<ChangeNotifier>,
}

impl SchedulingState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            notifier: Arc::new(ChangeNotifier::new()),
        }
    }
}

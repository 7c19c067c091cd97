//! Shared application state
//!
//! Built once at startup and handed to every handler through the axum router.

use std::sync::Arc;

use crate::clients::{Notifier, TabularStore};
use crate::config::environment::EnvironmentConfig;
use crate::services::submission_service::{SubmissionService, SubmissionSettings};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub store: Arc<dyn TabularStore>,
    pub submissions: Arc<SubmissionService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn TabularStore>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let settings = SubmissionSettings::from_config(&config);
        let submissions = SubmissionService::new(store.clone(), notifier, settings);
        Self::with_service(config, store, submissions)
    }

    /// State around an already configured submission service
    pub fn with_service(
        config: EnvironmentConfig,
        store: Arc<dyn TabularStore>,
        submissions: SubmissionService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            submissions: Arc::new(submissions),
        }
    }
}

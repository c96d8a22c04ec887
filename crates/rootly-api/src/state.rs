//! Application state.

use std::sync::Arc;

use rootly_classifier::{
    ClassifierCommand, ClassifierPool, ClassifierResult, ClassifierRunner, ScratchDir,
};

use crate::config::ApiConfig;
use crate::upload::UploadPolicy;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub scratch: ScratchDir,
    pub pool: ClassifierPool,
    pub command: Arc<ClassifierCommand>,
    pub runner: ClassifierRunner,
    pub upload_policy: Arc<UploadPolicy>,
}

impl AppState {
    /// Create new application state, preparing the scratch directory.
    pub async fn new(config: ApiConfig) -> ClassifierResult<Self> {
        let scratch = ScratchDir::new(&config.scratch_dir);
        scratch.ensure().await?;

        let pool = ClassifierPool::new(config.classifier.max_concurrent)
            .with_queue_timeout(config.classifier.queue_timeout);
        let runner = ClassifierRunner::new().with_timeout(config.classifier.timeout);
        let command = config.classifier.command();
        let upload_policy = UploadPolicy::from_config(&config);

        Ok(Self {
            config,
            scratch,
            pool,
            command: Arc::new(command),
            runner,
            upload_policy: Arc::new(upload_policy),
        })
    }
}

//! Application state.

use std::path::Path;
use std::sync::Arc;

use nscan_classify::{Classifier, OnnxTumorModel};
use nscan_imaging::{PreprocessConfig, RegionLocator};
use nscan_store::RecordStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<RecordStore>,
    pub classifier: Classifier,
    pub locator: Arc<RegionLocator>,
}

impl AppState {
    /// Create application state for the running service: open the record
    /// store and load the tumor model from disk. A missing model artifact
    /// is fatal here, before the server binds.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store = RecordStore::connect(&config.database_url).await?;
        let model = OnnxTumorModel::load(Path::new(&config.model_path))?;
        let classifier = Classifier::new(Arc::new(model));

        Ok(Self::with_parts(config, store, classifier))
    }

    /// Assemble state from already-built collaborators. Tests use this to
    /// inject an in-memory store and a stub model.
    pub fn with_parts(config: ApiConfig, store: RecordStore, classifier: Classifier) -> Self {
        let locator = RegionLocator::new(PreprocessConfig::from_env());
        Self {
            config,
            store: Arc::new(store),
            classifier,
            locator: Arc::new(locator),
        }
    }
}

use std::sync::Arc;

use crate::config::Settings;
use crate::engine::GradeEngine;
use crate::storage::UploadStore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    engine: Arc<GradeEngine>,
    uploads: UploadStore,
}

impl AppState {
    pub fn new(settings: Settings, engine: GradeEngine, uploads: UploadStore) -> Self {
        Self {
            inner: Arc::new(InnerState {
                settings,
                engine: Arc::new(engine),
                uploads,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn engine(&self) -> &Arc<GradeEngine> {
        &self.inner.engine
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }
}

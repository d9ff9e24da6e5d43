use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::{
    grader::GraderService, splitter::SplitterService, vector_store::VectorStoreService,
};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    metrics: Option<PrometheusHandle>,
    splitter: SplitterService,
    grader: GraderService,
    vector_store: VectorStoreService,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        metrics: Option<PrometheusHandle>,
        splitter: SplitterService,
        grader: GraderService,
        vector_store: VectorStoreService,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState { settings, db, metrics, splitter, grader, vector_store }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn metrics(&self) -> Option<&PrometheusHandle> {
        self.inner.metrics.as_ref()
    }

    pub(crate) fn splitter(&self) -> &SplitterService {
        &self.inner.splitter
    }

    pub(crate) fn grader(&self) -> &GraderService {
        &self.inner.grader
    }

    pub(crate) fn vector_store(&self) -> &VectorStoreService {
        &self.inner.vector_store
    }
}

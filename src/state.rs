//! Shared application state for all routes.

use crate::config::{ResolvedCatalog, ResolvedResource};
use crate::error::AppError;
use crate::service::CrudService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CrudService>,
}

impl AppState {
    pub fn new(service: CrudService) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }

    pub fn catalog(&self) -> &ResolvedCatalog {
        self.service.catalog()
    }

    /// Resource by path segment, or 404.
    pub fn resource(&self, name: &str) -> Result<&ResolvedResource, AppError> {
        self.catalog()
            .resource(name)
            .ok_or_else(|| AppError::NotFound(format!("resource {}", name)))
    }
}

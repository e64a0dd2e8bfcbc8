//! CrudService: generic resource operations on top of the query layer and a document store.

mod crud;
mod locks;
mod validation;
pub use crud::{CrudService, ListArgs, MutationSummary, ReorderArgs, ReorderResult};
pub use locks::WriteLocks;
pub use validation::RequestValidator;

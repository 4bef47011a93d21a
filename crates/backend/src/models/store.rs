//! Store reference data.

use serde::Serialize;

use crustline_core::StoreId;

/// A physical store location. Read-only for the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Store {
    pub id: StoreId,
    pub address: String,
    pub city: String,
    pub state: String,
}

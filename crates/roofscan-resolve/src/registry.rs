//! Read-only registry boundary.

use roofscan_core::Result;

use crate::types::PropertyRecord;

/// Source of known property records. The resolver never writes through it.
pub trait PropertyRegistry {
    /// All non-deleted property records, in a stable iteration order.
    fn properties(&self) -> Result<Vec<PropertyRecord>>;
}

impl PropertyRegistry for [PropertyRecord] {
    fn properties(&self) -> Result<Vec<PropertyRecord>> {
        Ok(self.to_vec())
    }
}

impl PropertyRegistry for Vec<PropertyRecord> {
    fn properties(&self) -> Result<Vec<PropertyRecord>> {
        Ok(self.clone())
    }
}

/// Take a frozen copy of the registry.
///
/// A failing registry is logged and treated as empty so that resolution
/// degrades to a manual match instead of failing the document.
pub fn snapshot<R: PropertyRegistry + ?Sized>(registry: &R) -> Vec<PropertyRecord> {
    match registry.properties() {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!("Property registry unavailable, resolving against empty set: {}", e);
            Vec::new()
        }
    }
}

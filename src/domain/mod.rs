//! Domain layer: country records, the external feed schemas, the
//! reconciliation rules, and the ports the application layer talks through.

pub mod country;
pub mod ports;
pub mod reconcile;
pub mod source;
pub mod summary;

//! Placeholder identifiers for employees admitted before the external system
//! has issued a final ID. Allocation only has to be unique among live
//! employee keys; the repository rejects collisions at insert as a backstop.

use std::sync::atomic::{AtomicU64, Ordering};

use super::domain::EmployeeId;

const TEMP_PREFIX: &str = "tmp-";

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Issue a fresh placeholder identifier.
pub fn allocate() -> EmployeeId {
    let id = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EmployeeId(format!("{TEMP_PREFIX}{id:06}"))
}

/// Whether an identifier is a placeholder awaiting resolution.
pub fn is_temporary(id: &EmployeeId) -> bool {
    id.0.starts_with(TEMP_PREFIX)
}

//! Replaying descriptors against a store

use super::descriptor::{Operation, QueryDescriptor};
use crate::error::StoreError;
use crate::store::StoreHandle;

/// Apply one recorded call to `handle`
///
/// Placeholder steps return the handle unchanged.
pub fn apply<H: StoreHandle>(handle: &H, operation: &Operation) -> Result<H, StoreError> {
    match operation {
        Operation::Collection(path) => handle.collection(path),
        Operation::Doc(path) => handle.doc(path),
        Operation::Where { field, op, value } => handle.where_field(field, *op, value.clone()),
        Operation::OrderBy { field, direction } => handle.order_by(field, *direction),
        Operation::Limit(limit) => handle.limit(*limit),
        Operation::Noop(_) => Ok(handle.clone()),
    }
}

/// Apply every call of `descriptor` to `root`, in call order
///
/// Stops at the first step the store rejects.
pub fn replay<H: StoreHandle>(root: H, descriptor: &QueryDescriptor) -> Result<H, StoreError> {
    descriptor
        .operations()
        .into_iter()
        .try_fold(root, |handle, operation| apply(&handle, operation))
}

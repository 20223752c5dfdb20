//! Built-in workloads
//!
//! Every workload operates under `<namespace>.<workloadId>` and scales with
//! the configured iteration count.

mod idle;
mod objects;
mod secondary;
mod states;

pub use idle::Idle;
pub use objects::{DelObjects, SetObjects};
pub use secondary::SecondaryStates;
pub use states::{DelStates, SetStates, SetStatesNonStrict, StateChangeSubscription};

use crate::error::WorkloadError;
use crate::host::StoreObject;
use crate::workload::WorkloadContext;

/// Create `count` numbered state objects via `id_of`
async fn create_state_objects(
    ctx: &WorkloadContext,
    count: u64,
    id_of: impl Fn(&WorkloadContext, u64) -> String,
) -> Result<(), WorkloadError> {
    for i in 0..count {
        let id = id_of(ctx, i);
        ctx.store
            .set_object(&id, StoreObject::state(&id, "number"))
            .await?;
    }
    Ok(())
}

/// Delete `count` numbered objects via `id_of`
async fn delete_objects(
    ctx: &WorkloadContext,
    count: u64,
    id_of: impl Fn(&WorkloadContext, u64) -> String,
) -> Result<(), WorkloadError> {
    for i in 0..count {
        ctx.store.del_object(&id_of(ctx, i)).await?;
    }
    Ok(())
}

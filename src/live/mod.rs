//! Live queries
//!
//! - `descriptor.rs`: recorded call chains (`fire_query().collection(..)..`)
//! - `dispatch.rs`: replaying a descriptor against a store handle
//! - `mapping.rs`: snapshots to flat records
//! - `state.rs`: the state handed to render code
//! - `live_query.rs`: the subscription scope tying it together

pub mod descriptor;
pub mod dispatch;
pub mod live_query;
pub mod mapping;
pub mod state;

pub use descriptor::{fire_query, Operation, QueryDescriptor, QueryMode};
pub use dispatch::{apply, replay};
pub use live_query::LiveQuery;
pub use mapping::{map_document, map_snapshot, LiveData, Record};
pub use state::{LiveState, Status};

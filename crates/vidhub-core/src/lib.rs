//! Identity and session authority plus the relational aggregation layer.
//!
//! Every operation here is a plain function of an optional caller identity,
//! validated input and a store implementing the traits in [`store`]. Routing,
//! serialization and status codes belong to `vidhub-api`.

pub mod aggregate;
pub mod content;
pub mod credentials;
pub mod error;
pub mod session;
pub mod store;
pub mod toggle;
pub mod token;

#[cfg(test)]
mod testing;

pub use error::{AuthFailure, CoreError, CoreResult, StoreError, StoreResult};
pub use session::Identity;

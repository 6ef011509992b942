//! Auth-domain value types: requested scopes, redacted secrets, and exchanged token bundles.

pub mod bundle;
pub mod scope;
pub mod secret;

pub use bundle::*;
pub use scope::*;
pub use secret::*;

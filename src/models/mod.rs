pub mod principal;
pub mod refresh;
pub mod role;

pub use principal::AuthenticatedPrincipal;
pub use refresh::RefreshRecord;
pub use role::{Role, UnknownRole};

mod errors;
mod metadata;
mod service;
mod types;

pub use errors::LfsError;
pub use metadata::{LfsMetadata, LfsPointer};
pub use service::LfsService;
pub use types::{FilePullMode, LfsPhase, LfsProgress};

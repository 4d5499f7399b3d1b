pub mod deep_link;
pub mod status;
pub mod types;
pub mod urn;

pub use status::PackageStatus;
pub use types::{Architecture, Image, ImageKind, ImageSource, InstallerType, Link};
pub use urn::PackageUrn;

//! Domain logic - pure release rules independent of git operations

pub mod branch;
pub mod tag;
pub mod version;

pub use branch::TrackingBranch;
pub use tag::{ReleaseTag, TagFlavor};
pub use version::{latest_released, next_version, Version, VersionBump};

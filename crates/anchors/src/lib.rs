pub mod anchor;
pub mod config;
pub mod error;
pub mod generator;
pub mod options;
pub mod serialization;

// Re-export commonly used types for convenience
pub use anchor::{SsdAnchor, to_array};
pub use error::AnchorError;
pub use generator::generate;
pub use options::{AnchorOptions, GridSizing};

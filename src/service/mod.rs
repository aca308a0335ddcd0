pub mod commission;
pub mod monthly;
pub mod normalizer;
pub mod production;
pub mod reconciler;
pub mod roster;
pub mod splitter;
pub mod targets;
pub mod uploader;
pub mod verifier;

pub use commission::CommissionJob;
pub use uploader::{FailedRow, InsertRow, UploadOptions, UploadReport};

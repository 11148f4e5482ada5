pub mod sdf;

pub use sdf::{open_sdf, SdfRecord, SdfRecords};

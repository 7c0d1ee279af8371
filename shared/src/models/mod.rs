//! Data model for the crop assessment pipeline

pub mod assessment;
pub mod crop;
pub mod freshness;
pub mod logistics;
pub mod market;
pub mod request;
pub mod weather;

pub use assessment::*;
pub use crop::*;
pub use freshness::*;
pub use logistics::*;
pub use market::*;
pub use request::*;
pub use weather::*;

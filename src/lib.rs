pub mod config;
pub mod error;
pub mod measure;
pub mod output;
pub mod server;
pub mod shutdown;
pub mod stats;

pub use config::{Profile, Settings, Variant};
pub use error::{FixtureError, Result};
pub use measure::Measurement;
pub use output::OutputWriter;
pub use server::{StubHandler, StubServer};

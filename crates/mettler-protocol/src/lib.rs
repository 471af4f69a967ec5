pub mod commands;
pub mod error;
pub mod frame;
pub mod identity;
pub mod parser;
pub mod units;

pub use commands::Command;
pub use error::ParseError;
pub use frame::LineCodec;
pub use identity::extract_quoted;
pub use parser::{ParsedReading, ResponseParser};
pub use units::WeightUnit;

pub mod client;
pub mod coerce;
pub mod generator;
pub mod prompts;
pub mod validation;

pub use client::*;
pub use coerce::*;
pub use generator::*;
pub use prompts::*;
pub use validation::*;

pub mod cli;
pub mod error;
pub mod net;
pub mod runtime;

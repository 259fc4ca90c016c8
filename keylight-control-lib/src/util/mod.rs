pub mod discovery;
pub mod resolve;

pub mod error;
pub mod logger;
pub mod time_value;
pub mod validation;

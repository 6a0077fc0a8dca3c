mod env_error;

pub use env_error::{EnvError, Result};

pub mod timeout;

pub use timeout::{TimeoutExt, TimeoutWrapper};

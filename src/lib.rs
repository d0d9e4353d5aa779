pub mod types;
pub mod utils;

pub use types::date::Date;
pub use utils::error::{DateFormatError, Result};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DateFormatError {
    #[error("date payload digit run does not fit a 64-bit integer: {0}")]
    InvalidMillis(#[from] std::num::ParseIntError),

    #[error("epoch milliseconds out of representable range: {0}")]
    OutOfRange(i64),
}

pub type Result<T> = std::result::Result<T, DateFormatError>;

// Types layer: value types shared by the Exact Online API models.

pub mod date;

pub use date::Date;

//! Sample arithmetic and the period block type.

pub mod gain;
pub mod period;

pub mod raw;
pub mod row;
pub mod sum;

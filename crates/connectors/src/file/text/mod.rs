pub mod sink;
pub mod source;
pub mod split;

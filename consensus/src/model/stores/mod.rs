pub mod ghostdag;
pub mod headers;
pub mod relations;

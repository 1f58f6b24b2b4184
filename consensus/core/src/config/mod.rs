pub mod bps;
pub mod constants;
pub mod params;

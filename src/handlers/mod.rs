pub mod constants;
pub mod doctors;

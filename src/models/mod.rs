mod doctor;

pub use doctor::*;

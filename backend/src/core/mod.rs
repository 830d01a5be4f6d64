//! Core time keeping for the monthly simulation loop

pub mod time;

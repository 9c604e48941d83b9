//! Simulation primitives shared by every other module

pub mod time;

pub mod columns;
pub mod dataset;
pub mod enso_phase;
pub mod frames;
pub mod station;

pub mod aggregate;
pub mod anomaly;
pub mod correlation;
pub mod error;
pub mod summary;
pub mod trend;
pub mod wavelet;

pub mod data_loader;
pub(crate) mod dates;
pub mod error;
pub mod frame_fetcher;
pub(crate) mod sheet_reader;

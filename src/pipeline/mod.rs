pub mod import;
pub mod processing;
pub mod storage;

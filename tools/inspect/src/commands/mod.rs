pub mod bundle;
pub mod cache;
pub mod classify;
pub mod locate;
pub mod report;

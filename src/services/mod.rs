pub mod poller;
pub mod providers;
pub mod storage;

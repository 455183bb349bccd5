pub mod dispatch;
pub mod domain;
pub mod poller;
pub mod store;

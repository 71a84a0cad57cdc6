pub mod audit;
pub mod dispatch;
pub mod init;
pub mod link;
pub mod schema;
pub mod shared;
pub mod suggest;

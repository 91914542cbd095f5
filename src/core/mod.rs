pub mod context;
pub mod direction;
pub mod error;
pub mod geom;
pub mod link;
pub mod loops;
pub mod modules;
pub mod ops;
pub mod persist;
pub mod port;
pub mod sim;
pub mod ticker;
pub mod types;
pub mod value;

pub mod block;
pub mod main;
pub mod report;
pub mod schema;

pub use block::*;
pub use main::*;
pub use report::*;
pub use schema::*;

pub mod frame;
pub mod record;
pub mod sample;
pub mod survey;

pub use frame::*;
pub use record::*;
pub use sample::*;
pub use survey::*;

pub mod driver;
pub mod log;
pub mod report;
pub mod store;

pub use driver::*;
pub use log::*;
pub use report::*;
pub use store::*;

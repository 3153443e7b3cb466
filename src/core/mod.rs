pub mod batch;
pub mod calendar;
pub mod plan;
pub mod report;
pub mod session;
pub mod storage;
pub mod transcript;

pub use batch::*;
pub use calendar::*;
pub use plan::*;
pub use report::*;
pub use session::*;
pub use storage::*;
pub use transcript::*;

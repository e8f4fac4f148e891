pub mod account;
pub mod appointment;
pub mod enums;
pub mod message;
pub mod payment;
pub mod report;

pub use account::*;
pub use appointment::*;
pub use enums::*;
pub use message::*;
pub use payment::*;
pub use report::*;

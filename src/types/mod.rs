//! Type definitions

pub mod input;
pub mod messages;
pub mod options;
pub mod route;
pub mod school;
pub mod stop;

pub use input::*;
pub use messages::*;
pub use options::*;
pub use route::*;
pub use school::*;
pub use stop::*;

//! Records read from and written to the relational store.

pub mod task;
pub mod user;

pub use task::{NewTask, Task, STATUS_RUNNING};
pub use user::User;

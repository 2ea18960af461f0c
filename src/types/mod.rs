mod auth;
mod bulk;
mod chat;
mod group;
mod mentorship;
mod notification;
mod professor;
mod research;
mod student;

pub use auth::*;
pub use bulk::*;
pub use chat::*;
pub use group::*;
pub use mentorship::*;
pub use notification::*;
pub use professor::*;
pub use research::*;
pub use student::*;

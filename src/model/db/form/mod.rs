mod base;
mod db;

pub use base::{FormCore, MoveDirection};
pub use db::{Form, FormOutline};

/// Form data ready for first insertion.
pub type NewForm = FormCore;

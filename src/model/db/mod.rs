pub mod cache;
pub mod category;
pub mod directory;
pub mod form;
pub mod response;

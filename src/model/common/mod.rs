pub mod audience;
pub mod form;
pub mod pager;

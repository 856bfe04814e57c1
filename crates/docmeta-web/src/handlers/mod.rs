pub mod docs;
pub mod extract;
pub mod index;

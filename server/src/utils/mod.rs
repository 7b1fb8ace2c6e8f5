pub mod error;
pub mod extract;
pub mod flash;
pub mod pagination;
pub mod response;

pub mod handlers;
pub mod header;
pub mod mode_selector;
pub mod results;
pub mod upload_section;
pub mod utils;

mod token_store_fs;

pub use token_store_fs::*;

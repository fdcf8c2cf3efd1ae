mod file;
mod memory;

pub use file::*;
pub use memory::*;

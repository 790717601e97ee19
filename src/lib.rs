pub mod chip8;
pub mod definitions;
pub mod devices;
pub mod memory;
pub mod opcode;
pub mod registers;
pub mod resources;
pub mod timer;
mod error;
mod runner;

// reexporting for convenience
pub use error::*;
pub use runner::*;

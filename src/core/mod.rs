pub mod chunk;
pub mod portal;
pub mod timebase;
pub mod walker;

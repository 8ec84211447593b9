pub mod session;

pub use session::{AudioSession, CompressorSession, ImageSession};

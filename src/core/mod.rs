pub mod export;
pub mod file_ops;
pub mod intake;
pub mod probe;
pub mod processor;
pub mod queue;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;

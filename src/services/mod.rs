pub mod converter;
pub mod queue;

pub mod app;
pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod render;

#[cfg(test)]
mod test_helpers;

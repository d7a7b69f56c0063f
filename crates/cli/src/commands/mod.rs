//! Command implementations.

mod evaluate;
mod info;
mod run;
mod validate;

pub use evaluate::run_evaluate;
pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

pub mod categories;
pub mod engine;
pub mod format;
pub mod gains;
pub mod inputs;
pub mod multiplier;
pub mod scoring;
pub mod validation;

pub use categories::*;
pub use engine::*;
pub use format::*;
pub use gains::*;
pub use inputs::*;
pub use multiplier::*;
pub use validation::*;

pub mod flatten;

pub use flatten::{Flattened, flatten_events};

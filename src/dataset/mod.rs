//! @ai:module:intent Test case definitions and dataset loading
//! @ai:module:layer domain
//! @ai:module:public_api TestCase, DatasetLoader

pub mod case;
pub mod loader;

pub use case::TestCase;
pub use loader::{DatasetLoader, DatasetLoaderTrait};

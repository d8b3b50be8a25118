//! Concrete diet variants.

pub mod enteral;
pub mod mista;
pub mod oral;
pub mod parenteral;

pub use enteral::{DietaEnteral, ParametrosEnteral};
pub use mista::{ComponenteMista, DietaMista};
pub use oral::{DietaOral, ParametrosOral};
pub use parenteral::{DietaParenteral, ParametrosParenteral};

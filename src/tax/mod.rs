pub mod calculator;
pub mod lots;
pub mod summary;
pub mod warnings;

// Flat public surface for domain types.
pub use calculator::{Calculator, CostBasisMethod};
pub use lots::Lot;
pub use summary::{RealizedGain, Summary, Term};
pub use warnings::Warning;

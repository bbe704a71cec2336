//! Boundary conditions and the per-polygon table that assigns them to edges.

pub mod condition;
pub mod table;

pub use condition::{BoundaryCondition, BoundaryConditionType};
pub use table::{BoundaryConditionTable, EdgeConditions};

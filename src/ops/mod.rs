//! High-level operations.
//!
//! This module contains the operations behind depfinder commands.

pub mod open;
pub mod scan;

pub use open::{get_project_types, open_solution, OpenOptions, Solution};
pub use scan::{find_solution_with_project, find_solutions, ScanOptions, SolutionScan};

//! Einsum notation parsing and representation.
//!
//! Supports the full einsum grammar:
//! - Basic: `ij,jk->ik`
//! - Ellipsis: `...ij,...jk->...ik`
//! - Implicit output: `ij,jk` (implies `->ik`)
//! - Extended alphabet: any alphabetic character is a label, see [`get_symbol`]

mod notation;
mod parser;
mod subscript;
pub mod validation;

pub use notation::EinsumNotation;
pub use parser::{get_symbol, parse_einsum};
pub use subscript::{Index, Labels, Subscript};
pub use validation::{validate_notation, validate_ranks, EllipsisDims};

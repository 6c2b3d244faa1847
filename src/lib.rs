//! Tree similarity: edit distance, bounds, and similarity joins/lookups over
//! ordered labeled trees and JSON trees.
//!
//! Layering mirrors the data flow of a join at threshold tau:
//! `parsing`/`label` build trees and intern labels, `indexing` materializes
//! the per-tree arrays every kernel reads, `cost` supplies del/ins/ren,
//! `ted`/`json` compute exact distances, `lb` supplies candidate generation
//! and cheap bounds, and `join` wires candidate generation, upper-bound
//! shortcuts and exact verification into the driver API consumers call.

pub mod config;
pub mod cost;
pub mod error;
pub mod indexing;
pub mod join;
pub mod label;
pub mod lb;
pub mod matrix;
pub mod parsing;
pub mod statistics;
pub mod ted;
pub mod validation;

pub mod json;

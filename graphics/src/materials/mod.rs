//! Material system for the rendering core.
//!
//! This module provides a two-level material abstraction:
//!
//! - [`ParamSet`] / [`Alias`] / [`ParamValue`] - Typed parameter storage
//!   keyed by semantic slot names, authored on material nodes
//! - [`AggregatedMaterial`] - The per-renderable sink those parameters are
//!   collected into during aggregation, with once-per-pass write gates
//!
//! # Identity-based Batching
//!
//! Every [`AggregatedMaterial`] carries a process-unique [`MaterialId`].
//! The routing layer keys render queues by this id, so draw commands that
//! share an aggregated material are bound together with one state change.

mod aggregated;
mod params;

pub use aggregated::{AggregatedMaterial, MaterialId};
pub use params::{Alias, ParamSet, ParamValue};

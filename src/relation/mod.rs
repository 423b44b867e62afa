//! Relation module: declarations of how collections reference each other, and their
//! resolution against a [crate::store::Store].
//!
//! # Module Organization
//!
//! - [`descriptor`]: [RelationDescriptor], one direction of a relation
//! - [`factory`]: constructors emitting matched forward/reverse descriptor pairs
//! - [`registry`]: [RegistryBuilder] verification and the [Registry] lookup table
//! - [`resolve`]: [Resolver], cardinality, ordering and polymorphic dispatch

pub mod descriptor;
pub mod factory;
mod registry;
mod resolve;

pub use descriptor::{Cardinality, FieldTemplate, Foreign, IdField, RelationDescriptor};
pub use factory::{
    make_generic_m2m, make_generic_o2m, make_generic_o2o, make_m2m, make_m2o, make_o2o,
    make_structured_m2m, make_structured_m2o, GenericM2M, GenericO2M, GenericO2O, RelationPair,
    StructuredM2M, StructuredM2O, M2M, M2O, O2O,
};
pub use registry::{Registry, RegistryBuilder};
pub use resolve::{order_records, Resolver};

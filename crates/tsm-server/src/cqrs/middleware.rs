//! CQRS marker traits
//!
//! Every request sent through the mediator is either a [`Command`], which
//! changes stored state, or a [`Query`], which only reads it. The markers let
//! cross-cutting layers treat the two kinds differently without knowing the
//! concrete request types.

/// A write request
pub trait Command {}

/// A read-only request
pub trait Query {}

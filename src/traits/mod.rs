//! Core traits for the autowiring container.

mod resolver;

pub use resolver::{Resolver, ResolverCore};

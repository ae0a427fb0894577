//! bomforest: a forest of bills of materials.
//!
//! Assemblies are built from parts and other assemblies; every tree in the
//! forest is acyclic and owns its nodes exclusively. See [`application::Registry`]
//! for the operations.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

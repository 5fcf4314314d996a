//! Relmap - Entity query translation and result materialization core
//!
//! This crate provides the query pipeline of a relational mapper:
//! - EQL (entity query language) parsing
//! - Typed semantic query model (SQM) construction against a domain model
//! - Lowering to a dialect-neutral SQL AST with a result-mapping plan
//! - SQL text rendering with ordered parameter bindings
//! - Row-to-object-graph assembly with identity management and lazy fetches
//! - Second-level cache keys and a compiled-query cache

pub mod utils;

pub mod cache;
pub mod config;
pub mod domain_model;
pub mod engine;
pub mod eql_parser;
pub mod exec;
pub mod sql_ast;
pub mod sql_renderer;
pub mod sqm;
pub mod translator;
pub mod type_registry;

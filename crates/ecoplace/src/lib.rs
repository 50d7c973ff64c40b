#![doc = include_str!("../README.md")]

pub mod common;
pub mod config;
pub mod crossover;
pub mod diagnostics;
pub mod error;
pub mod experiment;
pub mod genetic;
pub mod mutation;
pub mod population;
pub mod request;
pub mod resource;
pub mod resource_pool;
pub mod run_stats;
pub mod selection;
pub mod solution;
pub mod vm;

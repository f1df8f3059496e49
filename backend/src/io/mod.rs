//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers parse
//! requests, call one service operation and translate the outcome into a
//! status code and JSON body. No scheduling rules live here.

pub mod rest;

pub use rest::*;

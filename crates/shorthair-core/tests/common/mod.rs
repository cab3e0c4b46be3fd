#![allow(dead_code)]

pub mod memory_source;
pub mod range_server;

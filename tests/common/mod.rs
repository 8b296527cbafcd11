#![allow(dead_code)]

pub mod fake_invoker;
pub mod fixtures;

#![allow(dead_code)]

pub mod flaky_storage;

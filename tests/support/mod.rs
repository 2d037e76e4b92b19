#![allow(dead_code)]

pub mod doubles;
pub mod emld_env;
pub mod fixtures;

mod common;
mod options;
mod polymorphism;

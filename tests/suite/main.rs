mod chain_tests;
mod common;
mod evaluation_tests;
mod optimization_tests;
mod parser_tests;
mod pattern_tests;

// Shared helpers for integration tests
#![allow(dead_code)]

pub mod mock_services;
pub mod test_data;

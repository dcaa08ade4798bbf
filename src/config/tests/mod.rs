//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `field_resolution`: Token fallbacks and derived settings
//! - `loading`: Environment and CLI loading through `load_from_iter`
//! - `validation`: Configuration consistency validation tests

mod field_resolution;
mod helpers;

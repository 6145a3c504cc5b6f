//! Tests for template engine
//!
//! This module contains the engine tests, organized into focused submodules
//! by directive family.

use super::*;

// Test helper functions
mod helpers;


mod render_conditionals;
mod render_inheritance;

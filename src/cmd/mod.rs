/*!
 * Actual command handlers
 */

use crate::error::Result;

pub mod admin;
pub mod player;

/// Reply to print, if any
pub type StringResult = Result<Option<String>>;

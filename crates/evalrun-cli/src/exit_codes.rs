//! Process exit codes.

pub const SUCCESS: i32 = 0;
pub const RUN_FAILED: i32 = 1; // an execution errored or a score failed
pub const CONFIG_ERROR: i32 = 2; // unreadable suite, invalid plan, I/O failure

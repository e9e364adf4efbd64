//! Standard exit codes (BSD sysexits.h compatible)

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (invalid row, or a write that matched no row)
pub const DATAERR: i32 = 65;

/// Service unavailable (database fault)
pub const UNAVAILABLE: i32 = 69;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;

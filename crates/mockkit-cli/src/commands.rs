pub mod batch;
pub mod gen_cmd;

/// Exit code for resolution, parse and I/O failures. Usage errors exit with
/// clap's code 2.
pub const EXIT_FAILURE: i32 = 1;

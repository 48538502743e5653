// The fake cmd these tests drive is a POSIX sh script
#![cfg(unix)]

pub mod battery;
pub mod session;

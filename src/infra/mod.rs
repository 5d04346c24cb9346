pub mod credential;
pub mod git;
pub mod pty;

//! Front ends. Only the interactive console exists today.

pub mod pty;

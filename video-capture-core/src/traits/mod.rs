pub mod capture_device;
pub mod encoder_session;
pub mod session_control;
pub mod session_delegate;

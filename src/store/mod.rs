pub mod fallback;
pub mod remote;
pub mod resilient;

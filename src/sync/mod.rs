pub mod installer;
pub mod notifier;
pub mod source;
pub mod synchronizer;
pub mod validator;

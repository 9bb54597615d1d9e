pub mod command;
pub mod decode;
pub mod services;
pub mod synth;

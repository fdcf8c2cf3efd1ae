pub mod api;
pub mod audio;
pub mod credentials;

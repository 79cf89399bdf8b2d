mod dto;
pub mod services;

pub use dto::{LoginRequest, LoginResponse};
pub use services::{silent_login, LoginCodeProvider, LOGIN_PATH};

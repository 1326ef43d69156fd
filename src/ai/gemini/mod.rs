pub mod client;
pub mod rest;
pub mod shapes;
pub mod sse;
pub mod stream;
pub mod types;

pub use client::GeminiHttpClient;
pub use rest::{GeminiRestImage, GeminiRestText};
pub use stream::{GeminiStreamImage, GeminiStreamText};

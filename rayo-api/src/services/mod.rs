//! External service clients
//!
//! Each client owns a `reqwest::Client` with an explicit timeout and maps
//! transport and payload failures into its own error enum.

pub mod cms;
pub mod openai;
pub mod semrush;
pub mod shopify;
pub mod wordpress;

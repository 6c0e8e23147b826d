pub mod gemini;
pub mod traits;

pub use gemini::GeminiRestClient;
pub use traits::{BackendError, GenerativeBackend};

pub mod anthropic;
pub mod error;
pub mod json;
pub mod openai;
mod retry;
pub mod text;
pub mod throttle;
pub mod types;

pub use anthropic::AnthropicClient;
pub use error::LlmError;
pub use json::{parse_json_lenient, repair_json, strip_code_fences};
pub use openai::OpenAiClient;
pub use text::{estimate_tokens, truncate_to_char_boundary};
pub use throttle::Throttle;
pub use types::{ChatCompletion, ChatMessage, ChatRequest, Role, Usage};

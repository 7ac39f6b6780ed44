mod completion;
mod output;
mod traits;

pub use completion::CompletionClient;
pub use output::RawResponse;
pub use traits::{ClientConfig, ClientError, GenerationRequest, Generator, SupportedModel};

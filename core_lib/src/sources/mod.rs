pub mod encoding;
pub mod ethnode;
pub mod external;
pub mod web;

pub use encoding::{extract_height, parse_prefixed_int, HeightEncoding};
pub use ethnode::NodeClient;
pub use external::ExternalSource;
pub use web::{build_client, fetch_json};

use crate::error::SourceError;

/// Anything that can report a block height.
#[async_trait::async_trait]
pub trait HeightSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_height(&self) -> Result<i64, SourceError>;
}

//! Telemetry helpers: token estimation, log previews, key redaction and call records

mod io;
mod paths;
mod preview;
mod tokens;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::Paths;
pub use preview::{preview, redact_api_key, PREVIEW_LEN};
pub use tokens::{estimate_tokens, CHARS_PER_TOKEN};
pub use types::{CallOutcome, CallRecord, Correlation};

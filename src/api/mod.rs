//! HTTP API module for the absence reconciliation engine.
//!
//! Five workbooks are uploaded as one multipart request; the result comes
//! back either as the packaged workbook or as a JSON preview.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::{MAX_UPLOAD_BYTES, create_router};
pub use request::{UploadBundle, UploadSlot};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;

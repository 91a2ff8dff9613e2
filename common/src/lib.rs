//! Photo Scope Common Library
//!
//! CLIとHTTPクライアントで共有される型と状態機械（I/Oなし）

pub mod types;
pub mod error;
pub mod selection;
pub mod preview;
pub mod payload;
pub mod endpoint;
pub mod parser;
pub mod workflow;
pub mod export;

pub use types::{ArtifactKind, ArtifactRef, Estimate, JobId, LineItem, PhotoEstimate, ReportResult};
pub use error::{Error, ErrorInfo, ErrorKind, Result};
pub use selection::{mime_for_file_name, AuxiliaryField, FileHandle, SelectionManager, SelectionState};
pub use preview::{derive_previews, PreviewHandle, PreviewRegistry};
pub use payload::{MultipartPayload, Part, PartBody, PhotoFieldName, SubmissionRequest, UploadTarget};
pub use endpoint::{resolve_endpoint, EndpointEnv, EndpointSource, Endpoints, ResolvedEndpoint};
pub use parser::{classify_upload_response, decode_error_body, parse_generate_response, UploadOutcome};
pub use workflow::{Completion, RetrievalRejection, SubmitRejection, Ticket, Workflow, WorkflowState};

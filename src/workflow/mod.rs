pub mod process_flow;
pub mod row_ctx;

pub use process_flow::{ProcessFlow, ProcessOutcome, ProcessRequest, PROCESSED_AT_FORMAT};
pub use row_ctx::RowCtx;

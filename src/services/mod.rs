pub mod column_resolver;
pub mod row_locator;
pub mod row_updater;
pub mod text_processor;

pub use column_resolver::ColumnResolver;
pub use row_locator::RowLocator;
pub use row_updater::{RowUpdater, UpdateTarget, PROCESSED_AT_OFFSET};
pub use text_processor::{build_prompt, LlmService, TextProcessor};

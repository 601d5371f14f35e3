pub mod adapter;
pub mod error;
pub mod i18n;
pub mod narrate;
pub mod prompt;
pub mod snapshot;
pub mod types;

pub use adapter::{MergeOptions, MergeStatus, RefSpec, Repository};
pub use error::{GitmvError, Result};
pub use i18n::{Catalog, Language};
pub use narrate::{Narrator, Notice};
pub use prompt::{Choice, Prompter, Question};
pub use snapshot::{CommitInfo, Snapshot};
pub use types::*;

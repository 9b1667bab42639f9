//! # Data Loader Crate
//!
//! This crate loads the MovieLens CSV tables, cleans them, and encodes
//! movie genres for itemset mining.
//!
//! ## Main Components
//!
//! - **parser**: CSV files -> raw, all-optional rows, plus per-table summaries
//! - **preprocess**: missing-value policy, epoch -> date, builds the `DataIndex`
//! - **index**: dataset paths, parallel loading, secondary indices, movie stats
//! - **encoding**: sorted genre vocabulary and the one-hot `GenreMatrix`
//! - **stats**: descriptive statistics (most rated, distributions, per year)
//! - **error**: file-level load errors
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{DataIndex, GenreMatrix};
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/ml-20m"))?;
//! let matrix = GenreMatrix::from_index(&index);
//!
//! println!("{} movies x {} genres", matrix.num_rows(), matrix.num_columns());
//! ```

// Public modules
pub mod encoding;
pub mod error;
pub mod index;
pub mod parser;
pub mod preprocess;
pub mod stats;
pub mod types;

// Re-export commonly used types for convenience
pub use encoding::{GenreMatrix, GenreRecord};
pub use error::{DataLoadError, Result};
pub use index::{DataPaths, RawDataset};
pub use parser::{ColumnNulls, TableSummary};
pub use preprocess::{PreprocessReport, TableReport};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    DataIndex,
    Genre,
    Link,
    Movie,
    MovieStats,
    Rating,
    Tag,
    // Helpers
    NO_GENRES_LISTED,
    join_genres,
};

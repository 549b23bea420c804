// ==========================================
// Project Site Tracker - Importer layer
// ==========================================
// The staged import pipeline:
//   file_parser      - tabular file -> raw row maps
//   row_normalizer   - raw row -> NormalizedRecord
//   conflict_detector - records vs store snapshot -> classified conflicts
//   conflict_resolver - conflicts + operator decisions -> buckets
//   site_importer_*  - orchestration, transaction, audit, ledger
// ==========================================

pub mod conflict_detector;
pub mod conflict_resolver;
pub mod error;
pub mod file_parser;
pub mod row_normalizer;
pub mod site_importer_impl;
pub mod site_importer_trait;

pub use error::{ImportError, PipelineResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use site_importer_impl::SiteImporterImpl;
pub use site_importer_trait::SiteImporter;

// ==========================================
// シフト不足分析コア - 取り込み層
// ==========================================
// 職責: 外部ファイル（CSV）→ 領域モデル
// ==========================================

pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod table_loader;

// 主要型の再エクスポート
pub use error::{ImportError, ImportResult};
pub use file_parser::CsvParser;
pub use importer_trait::{FileParser, RawRow, RawTable};
pub use table_loader::{parse_cell, parse_date_label, parse_timestamp, TableLoader};

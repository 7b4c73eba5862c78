// ==========================================
// ログ初期化
// ==========================================
// tracing + tracing-subscriber
// ログレベルは環境変数で指定
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 出力形式を切り替える環境変数（"json" で JSON 行出力）
pub const LOG_FORMAT_ENV: &str = "SHIFT_SHORTAGE_LOG_FORMAT";

/// ログ初期化
///
/// # 環境変数
/// - RUST_LOG: フィルタ（既定: info）
///   例: RUST_LOG=debug または RUST_LOG=shift_shortage=trace
/// - SHIFT_SHORTAGE_LOG_FORMAT=json: JSON 形式で出力
///
/// # 例
/// ```no_run
/// use shift_shortage::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// テスト用ログ初期化（debug レベル, 重複呼び出し可）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

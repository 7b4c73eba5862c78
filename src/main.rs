// ==========================================
// シフト不足分析コア - コマンドライン入口
// ==========================================
// 使い方:
//   shift-shortage <demand.csv> <staff.csv> [--slot-hours H] [--slot-minutes M]
//                  [--data-dir DIR] [--working-data CSV] [--target ROLE]
//                  [--total-hours H] [--db PATH] [--json OUT]
// ==========================================

use anyhow::{anyhow, bail, Context};
use rusqlite::Connection;
use shift_shortage::config::{ConfigManager, ShortageConfig, ShortageConfigReader};
use shift_shortage::db::{configure_sqlite_connection, default_db_path, init_schema, DB_PATH_ENV};
use shift_shortage::engine::{ShortageCalculator, SlotHoursRequest};
use shift_shortage::importer::TableLoader;
use shift_shortage::repository::{RunContext, ShortageRunRepository};
use shift_shortage::{logging, OccupationBreakdown, ShortageResult};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct CliArgs {
    demand: PathBuf,
    staffing: PathBuf,
    slot_hours: Option<f64>,
    slot_minutes: Option<f64>,
    data_dir: Option<PathBuf>,
    working_data: Option<PathBuf>,
    target: Option<String>,
    total_hours: Option<f64>,
    db: Option<PathBuf>,
    json: Option<PathBuf>,
}

const USAGE: &str = "usage: shift-shortage <demand.csv> <staff.csv> [--slot-hours H] \
[--slot-minutes M] [--data-dir DIR] [--working-data CSV] [--target ROLE] \
[--total-hours H] [--db PATH] [--json OUT]";

fn parse_args(mut raw: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut args = CliArgs::default();
    let mut positional = Vec::new();

    while let Some(arg) = raw.next() {
        if !arg.starts_with("--") {
            positional.push(arg);
            continue;
        }
        let value = raw
            .next()
            .ok_or_else(|| anyhow!("{} に値がない\n{}", arg, USAGE))?;
        match arg.as_str() {
            "--slot-hours" => args.slot_hours = Some(parse_number(&arg, &value)?),
            "--slot-minutes" => args.slot_minutes = Some(parse_number(&arg, &value)?),
            "--data-dir" => args.data_dir = Some(PathBuf::from(value)),
            "--working-data" => args.working_data = Some(PathBuf::from(value)),
            "--target" => args.target = Some(value),
            "--total-hours" => args.total_hours = Some(parse_number(&arg, &value)?),
            "--db" => args.db = Some(PathBuf::from(value)),
            "--json" => args.json = Some(PathBuf::from(value)),
            other => bail!("未知のオプション: {}\n{}", other, USAGE),
        }
    }

    match positional.as_slice() {
        [demand, staffing] => {
            args.demand = PathBuf::from(demand);
            args.staffing = PathBuf::from(staffing);
        }
        _ => bail!("{}", USAGE),
    }
    Ok(args)
}

fn parse_number(flag: &str, value: &str) -> anyhow::Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{} の値が数値ではない: {}", flag, value))
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let args = parse_args(std::env::args().skip(1))?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", shift_shortage::APP_NAME, shift_shortage::VERSION);
    tracing::info!("==================================================");

    // DB 指定時（または環境変数設定時）は設定を config_kv から読む
    let db_path = args
        .db
        .clone()
        .or_else(|| std::env::var_os(DB_PATH_ENV).map(|_| default_db_path()));
    let conn = match &db_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("DB ディレクトリを作れない: {}", parent.display()))?;
            }
            let conn = Connection::open(path)
                .with_context(|| format!("DB を開けない: {}", path.display()))?;
            configure_sqlite_connection(&conn)?;
            init_schema(&conn)?;
            Some(Arc::new(Mutex::new(conn)))
        }
        None => None,
    };
    let config_manager = conn
        .as_ref()
        .map(|c| ConfigManager::from_connection(c.clone()))
        .transpose()?;

    let mut config = match &config_manager {
        Some(manager) => manager.load_shortage_config()?,
        None => ShortageConfig::default(),
    };
    if let Some(target) = &args.target {
        config = config.with_target(target.clone());
    }

    let calculator = ShortageCalculator::new(config)?;
    let request = SlotHoursRequest {
        explicit_hours: args.slot_hours,
        legacy_minutes: args.slot_minutes,
        auto_detect: args.data_dir.is_some(),
        data_dir: args.data_dir.clone(),
    };
    let result = calculator.calculate_from_files(&args.demand, &args.staffing, &request)?;
    print_summary(&result);

    let breakdown = match &args.working_data {
        Some(path) => {
            let working = TableLoader.load_working_data(path)?;
            let total = args.total_hours.unwrap_or(result.net_hours);
            let breakdown = calculator.occupation_breakdown(
                &working,
                args.data_dir.as_deref(),
                result.slot_hours,
                total,
            )?;
            print_breakdown(&breakdown);
            Some(breakdown)
        }
        None => None,
    };

    if let Some(path) = &args.json {
        let mut json = serde_json::json!({ "result": result });
        if let Some(breakdown) = &breakdown {
            json["occupations"] = serde_json::to_value(breakdown)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("JSON を書けない: {}", path.display()))?;
        println!("JSON: {}", path.display());
    }

    if let (Some(conn), Some(manager)) = (conn, config_manager) {
        let repo = ShortageRunRepository::from_connection(conn);
        let context = RunContext {
            demand_source: Some(args.demand.display().to_string()),
            staffing_source: Some(args.staffing.display().to_string()),
            config_snapshot_json: Some(manager.get_config_snapshot()?),
        };
        let run_id = repo.save_run(&result, &context)?;
        if let Some(breakdown) = &breakdown {
            repo.save_occupation_breakdown(&run_id, breakdown)?;
        }
        println!("run_id={}", run_id);
    }

    Ok(())
}

fn print_summary(result: &ShortageResult) {
    println!("スロット長: {}h ({})", result.slot_hours, result.slot_hours_source);
    println!(
        "過不足: net {:.2}h / 不足 {:.2}h / 過剰 {:.2}h",
        result.net_hours, result.shortage_hours, result.excess_hours
    );
    let stats = &result.statistics;
    println!(
        "集中度 {:.3} / 釣り合い {:.3} / 過不足ゼロ率 {:.3}",
        stats.concentration_index, stats.balance_efficiency, stats.utilization_rate
    );
    if let Some(peak) = &stats.slots.peak_shortage {
        println!("不足ピーク: {} ({:.2}h)", peak.slot, peak.hours);
    }
    for warning in &result.validation.warnings {
        println!("警告: {}", warning);
    }
    for error in &result.validation.errors {
        println!("エラー: {}", error);
    }
}

fn print_breakdown(breakdown: &OccupationBreakdown) {
    println!(
        "{}: {:.2}h ({})",
        breakdown.target.occupation, breakdown.target.hours, breakdown.target.source
    );
    for other in &breakdown.others {
        println!("  {}: {:.2}h ({})", other.occupation, other.hours, other.source);
    }
    println!(
        "{}: {:.2}h ({})",
        breakdown.other_bucket.occupation, breakdown.other_bucket.hours, breakdown.other_bucket.source
    );
    for warning in &breakdown.warnings {
        println!("警告: {}", warning);
    }
}

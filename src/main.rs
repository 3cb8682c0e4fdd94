// ==========================================
// 生产日志看板 - 命令行入口
// ==========================================
// 职责: 日记录维护、指标查看、备份/恢复、报表导出、配置与云同步开关
// ==========================================

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use production_logbook::app::{get_default_db_path, AppState};
use production_logbook::domain::{BreakdownEvent, MachineType, ProductionRecord, Shift, TimeWindow};
use production_logbook::i18n::{self, t, t_with_args};
use production_logbook::report::write_day_report_file;
use production_logbook::{logging, MetricsEngine, APP_NAME, VERSION};

#[derive(Parser)]
#[command(
    name = "production-logbook",
    version = env!("CARGO_PKG_VERSION"),
    about = "车间生产日志看板: 班次产量指标与离线优先同步",
    long_about = None
)]
struct Cli {
    /// 数据库路径（默认: 用户数据目录，或 PRODUCTION_LOGBOOK_DB_PATH）
    #[arg(global = true, long = "db")]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示同步状态
    Status,

    /// 列出已有日记录
    List,

    /// 显示某日某机型的逐行指标与汇总
    Show {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(value_parser = parse_machine_type)]
        machine_type: MachineType,
    },

    /// 计算 JSON 文件中生产行的指标（单个对象或数组）
    Metrics { path: PathBuf },

    /// 追加一行生产记录
    AddRow {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(value_parser = parse_machine_type)]
        machine_type: MachineType,
        #[arg(long, value_parser = parse_shift, default_value = "Day")]
        shift: Shift,
        /// 开始时间 HH:MM
        #[arg(long)]
        start: String,
        /// 结束时间 HH:MM
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "")]
        machine: String,
        /// 产品名；存在于配置中时自动带出产品参数
        #[arg(long, default_value = "")]
        product: String,
        #[arg(long, default_value_t = 0)]
        achieved: i64,
        #[arg(long, default_value_t = 0)]
        rejection: i64,
        #[arg(long, default_value_t = 0)]
        startup: i64,
        #[arg(long)]
        rate: Option<f64>,
        #[arg(long)]
        cavities: Option<u32>,
        #[arg(long)]
        weight: Option<f64>,
        /// 停机事件: 类别,HH:MM,HH:MM（可重复）
        #[arg(long = "breakdown")]
        breakdowns: Vec<String>,
    },

    /// 删除一行生产记录
    RemoveRow {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(value_parser = parse_machine_type)]
        machine_type: MachineType,
        index: usize,
    },

    /// 设置班长
    Supervisors {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(value_parser = parse_machine_type)]
        machine_type: MachineType,
        #[arg(long, default_value = "")]
        day: String,
        #[arg(long, default_value = "")]
        night: String,
    },

    /// 导出 JSON 备份
    Export { path: PathBuf },

    /// 导入 JSON 备份（完全覆盖本地与云端）
    Import {
        path: PathBuf,
        #[arg(long)]
        yes: bool,
    },

    /// 导出日报表 CSV
    Report {
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
        #[arg(value_parser = parse_machine_type)]
        machine_type: MachineType,
        out: PathBuf,
    },

    /// 开启/关闭云同步（命令行使用进程内云端，退出后云端数据不保留）
    Cloud {
        #[arg(value_parser = parse_on_off, action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// 手动重新推送到云端
    Resync,

    /// 显示最近的同步日志
    SyncLog {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// 查看或修改应用配置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 打印全部配置
    Print,
    /// 设置配置项
    Set { key: String, value: String },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("日期格式应为 YYYY-MM-DD: {}", e))
}

fn parse_machine_type(s: &str) -> Result<MachineType, String> {
    MachineType::from_code(s).ok_or_else(|| format!("未知机型: {}（IM 或 BM）", s))
}

fn parse_shift(s: &str) -> Result<Shift, String> {
    Shift::from_code(s).ok_or_else(|| format!("未知班次: {}（Day 或 Night）", s))
}

fn parse_on_off(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("应为 on/off: {}", other)),
    }
}

fn parse_breakdown(text: &str) -> Result<BreakdownEvent> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [category, start, end] => Ok(BreakdownEvent::new(*category, TimeWindow::parse(start, end))),
        _ => bail!("停机事件格式应为 类别,HH:MM,HH:MM: {}", text),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!("{} v{}，数据库: {}", APP_NAME, VERSION, db_path);

    let state = AppState::new(db_path).await.map_err(|e| anyhow!(e))?;
    let result = run(&state, cli.command).await;
    state.reconciler.shutdown();
    result
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    let api = &state.production_api;

    match command {
        Commands::Status => {
            let status = api.sync_status();
            println!("local: {}", i18n::status_label(status.local_status));
            println!("cloud: {}", i18n::status_label(status.cloud_status));
            match status.last_sync_timestamp {
                Some(ts) => println!("last sync: {}", ts.to_rfc3339()),
                None => println!("last sync: -"),
            }
            println!("entries: {}", api.reconciler().dataset().len());
            if !state.remote_store.is_durable() {
                println!("note: {}", t("cloud.volatile"));
            }
        }

        Commands::List => {
            for key in api.list_day_keys() {
                println!("{}", key);
            }
        }

        Commands::Show { date, machine_type } => {
            let record = api.day_record(date, machine_type);
            let metrics = api.row_metrics(date, machine_type);
            for (index, (row, m)) in record.rows.iter().zip(metrics.iter()).enumerate() {
                println!(
                    "#{:<3} {:<6} {:<8} {:<16} plan={:<6} achieved={:<6} lost={:<6} accepted={:<6} eff={:.1}%",
                    index,
                    i18n::shift_label(row.shift),
                    row.machine,
                    row.product,
                    m.plan_qty,
                    row.achieved_qty,
                    m.lost_qty,
                    m.accepted_qty,
                    m.efficiency_pct
                );
            }
            let summary = api.day_summary(date, machine_type);
            println!(
                "total: plan={} achieved={} accepted={} ({:.2} kg) eff={:.1}%",
                summary.total.plan_qty,
                summary.total.achieved_qty,
                summary.total.accepted_qty,
                summary.total.accepted_kg,
                summary.total.efficiency_pct
            );
            for loss in &summary.breakdown_by_category {
                println!(
                    "  {}: {} 次, {} 分钟, 损失 {}",
                    loss.category, loss.event_count, loss.minutes, loss.lost_qty
                );
            }
        }

        Commands::Metrics { path } => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| t_with_args("import.file_not_found", &[("path", &path.display().to_string())]))?;
            let rows: Vec<ProductionRecord> = match serde_json::from_str::<Vec<ProductionRecord>>(&json) {
                Ok(rows) => rows,
                Err(_) => vec![serde_json::from_str::<ProductionRecord>(&json)
                    .with_context(|| format!("生产行格式错误: {}", path.display()))?],
            };
            let results = MetricsEngine::new().compute_batch(&rows);
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        Commands::AddRow {
            date,
            machine_type,
            shift,
            start,
            end,
            machine,
            product,
            achieved,
            rejection,
            startup,
            rate,
            cavities,
            weight,
            breakdowns,
        } => {
            let mut row = ProductionRecord::new(shift, TimeWindow::parse(&start, &end));
            row.machine = machine;
            if !product.trim().is_empty() {
                if let Err(e) = api.fill_from_product(&mut row, &product) {
                    tracing::warn!("{}", e);
                }
                row.product = product;
            }
            if let Some(rate) = rate {
                row.rate_per_hour = rate;
            }
            if let Some(cavities) = cavities {
                row.cavities = cavities;
            }
            if let Some(weight) = weight {
                row.unit_weight_grams = weight;
            }
            row.achieved_qty = achieved;
            row.rejection_qty = rejection;
            row.startup_qty = startup;
            for item in &breakdowns {
                row.breakdowns.push(parse_breakdown(item)?);
            }

            let index = api.append_row(date, machine_type, row)?;
            println!("{} #{}", t("common.success"), index);
        }

        Commands::RemoveRow { date, machine_type, index } => {
            api.remove_row(date, machine_type, index)?;
            println!("{}", t("common.success"));
        }

        Commands::Supervisors { date, machine_type, day, night } => {
            api.set_supervisors(date, machine_type, &day, &night)?;
            println!("{}", t("common.success"));
        }

        Commands::Export { path } => {
            let count = api.export_to_file(&path)?;
            let path_text = path.display().to_string();
            let count_text = count.to_string();
            println!(
                "{}",
                t_with_args("export.completed", &[("count", &count_text), ("path", &path_text)])
            );
        }

        Commands::Import { path, yes } => {
            if !path.exists() {
                bail!(t_with_args("import.file_not_found", &[("path", &path.display().to_string())]));
            }
            if !yes {
                bail!(t("import.confirm"));
            }
            let count = api.import_from_file(&path).await?;
            println!(
                "{}",
                t_with_args("import.completed", &[("count", &count.to_string())])
            );
        }

        Commands::Report { date, machine_type, out } => {
            let record = api.day_record(date, machine_type);
            let summary = api.day_summary(date, machine_type);
            write_day_report_file(&out, &record, &summary)
                .with_context(|| format!("报表写入失败: {}", out.display()))?;
            println!(
                "{}",
                t_with_args("report.completed", &[("path", &out.display().to_string())])
            );
        }

        Commands::Cloud { enabled } => {
            state.set_cloud_enabled(enabled).await.map_err(|e| anyhow!(e))?;
            println!("cloud: {}", i18n::status_label(api.sync_status().cloud_status));
            if enabled && !state.remote_store.is_durable() {
                println!("note: {}", t("cloud.volatile"));
            }
        }

        Commands::Resync => {
            api.reconciler().resync().await?;
            println!("cloud: {}", i18n::status_label(api.sync_status().cloud_status));
        }

        Commands::SyncLog { limit } => {
            for entry in state.sync_log_repo.list_recent(limit)? {
                println!(
                    "{} {:<15} {:<24} local={} cloud={} entries={} {}",
                    entry.logged_at.to_rfc3339(),
                    entry.trigger,
                    entry.outcome,
                    entry.local_status,
                    entry.cloud_status,
                    entry.entry_count,
                    entry.detail.unwrap_or_default()
                );
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Print => {
                println!("{}", state.config_manager.get_config_snapshot()?);
            }
            ConfigAction::Set { key, value } => {
                state.config_manager.set_config_value(&key, &value)?;
                println!("{}", t("common.success"));
            }
        },
    }

    Ok(())
}

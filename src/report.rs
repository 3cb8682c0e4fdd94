// ==========================================
// 生产日志看板 - CSV 指标报表
// ==========================================
// 每个生产行一行指标，末尾附白班/夜班/全天合计
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::production::DayRecord;
use crate::domain::time_window::ClockTime;
use crate::engine::day_summary::{DaySummary, ShiftTotals};
use crate::engine::metrics::compute_metrics;
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 21] = [
    "date",
    "machine_type",
    "shift",
    "supervisor",
    "machine",
    "product",
    "start",
    "end",
    "duration_min",
    "plan_qty",
    "achieved_qty",
    "lost_qty",
    "breakdown_min",
    "breakdown_lost_qty",
    "efficiency_loss_qty",
    "accepted_qty",
    "plan_kg",
    "achieved_kg",
    "lost_kg",
    "accepted_kg",
    "efficiency_pct",
];

fn clock(value: Option<ClockTime>) -> String {
    value.map(|t| t.to_string()).unwrap_or_default()
}

/// 写出日报表
pub fn write_day_report<W: Write>(writer: W, record: &DayRecord, summary: &DaySummary) -> ApiResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    wtr.write_record(HEADER)?;

    let date = record.date.format("%Y-%m-%d").to_string();
    let machine_type = record.machine_type.as_str();

    for row in &record.rows {
        let m = compute_metrics(row);
        wtr.write_record([
            date.clone(),
            machine_type.to_string(),
            row.shift.to_string(),
            record.supervisor(row.shift).to_string(),
            row.machine.clone(),
            row.product.clone(),
            clock(row.window.start),
            clock(row.window.end),
            m.duration_minutes.to_string(),
            m.plan_qty.to_string(),
            row.achieved_qty.to_string(),
            m.lost_qty.to_string(),
            m.breakdown_minutes.to_string(),
            m.breakdown_lost_qty.to_string(),
            m.efficiency_loss_qty.to_string(),
            m.accepted_qty.to_string(),
            format!("{:.2}", m.plan_kg),
            format!("{:.2}", m.achieved_kg),
            format!("{:.2}", m.lost_kg),
            format!("{:.2}", m.accepted_kg),
            format!("{:.1}", m.efficiency_pct),
        ])?;
    }

    for (label, totals) in [
        ("TOTAL_DAY", &summary.day_shift),
        ("TOTAL_NIGHT", &summary.night_shift),
        ("TOTAL", &summary.total),
    ] {
        wtr.write_record(totals_record(&date, machine_type, label, totals))?;
    }

    wtr.flush()?;
    Ok(())
}

fn totals_record(date: &str, machine_type: &str, label: &str, t: &ShiftTotals) -> Vec<String> {
    vec![
        date.to_string(),
        machine_type.to_string(),
        label.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        t.plan_qty.to_string(),
        t.achieved_qty.to_string(),
        t.lost_qty.to_string(),
        t.breakdown_minutes.to_string(),
        t.breakdown_lost_qty.to_string(),
        t.efficiency_loss_qty.to_string(),
        t.accepted_qty.to_string(),
        format!("{:.2}", t.plan_kg),
        format!("{:.2}", t.achieved_kg),
        format!("{:.2}", t.lost_kg),
        format!("{:.2}", t.accepted_kg),
        format!("{:.1}", t.efficiency_pct),
    ]
}

/// 写出日报表到文件
pub fn write_day_report_file(path: &Path, record: &DayRecord, summary: &DaySummary) -> ApiResult<()> {
    let file = std::fs::File::create(path)?;
    write_day_report(file, record, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::production::ProductionRecord;
    use crate::domain::time_window::TimeWindow;
    use crate::domain::types::{MachineType, Shift};
    use crate::engine::day_summary::DaySummaryEngine;
    use chrono::NaiveDate;

    #[test]
    fn test_report_rows_and_totals() {
        let mut record = DayRecord::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), MachineType::BM);
        record.day_supervisor = "Chen".to_string();
        let mut row = ProductionRecord::new(Shift::Day, TimeWindow::parse("08:00", "20:00"));
        row.machine = "BM-02".to_string();
        row.rate_per_hour = 100.0;
        row.cavities = 2;
        row.unit_weight_grams = 10.0;
        row.achieved_qty = 2200;
        record.push_row(row);

        let summary = DaySummaryEngine::new().summarize(&record);
        let mut buffer = Vec::new();
        write_day_report(&mut buffer, &record, &summary).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 1 + 1 + 3);
        assert!(lines[0].starts_with("date,machine_type,shift"));
        assert!(lines[1].contains("Chen"));
        assert!(lines[1].contains(",2400,2200,200,"));
        assert!(lines[4].starts_with("2024-06-01,BM,TOTAL,"));
    }
}

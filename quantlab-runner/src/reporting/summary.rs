//! Plain-text run summary for terminal output.

use std::fmt::Write;

use crate::runner::BacktestResult;

fn pct(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}%", value * 100.0)
    }
}

fn ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{value:.2}")
    }
}

/// Render a one-run summary block.
pub fn render_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut out = String::new();

    let _ = writeln!(out, "Run {}", &result.run_id[..16.min(result.run_id.len())]);
    let _ = writeln!(out, "Strategy:       {}", result.config.strategy.name);
    let _ = writeln!(
        out,
        "Bars:           {} ({} warmup)",
        result.bar_count, result.warmup_bars
    );
    let _ = writeln!(out, "Final equity:   {:.2}", result.final_equity);
    let _ = writeln!(out, "Total return:   {}", pct(m.total_return));
    let _ = writeln!(out, "CAGR:           {}", pct(m.cagr));
    let _ = writeln!(out, "Sharpe:         {}", ratio(m.sharpe));
    let _ = writeln!(out, "Sortino:        {}", ratio(m.sortino));
    let _ = writeln!(out, "Max drawdown:   {}", pct(m.max_drawdown));
    let _ = writeln!(out, "Trades:         {}", m.trade_count);
    let _ = writeln!(out, "Win rate:       {}", pct(m.win_rate));
    let _ = writeln!(out, "Avg win/loss:   {:.2} / {:.2}", m.avg_win, m.avg_loss);
    let _ = writeln!(out, "Profit factor:  {}", ratio(m.profit_factor));
    if !result.rejected_entries.is_empty() {
        let _ = writeln!(
            out,
            "Rejected entries: {}",
            result.rejected_entries.len()
        );
    }

    out
}

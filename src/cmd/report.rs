//! Report command - capital gains summary over a transactions file

use crate::cmd::{run_calculator, CsvFormatArg, MethodArg};
use crate::tax::{Summary, Warning};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// Transactions file, CSV or JSON ("-" for CSV on stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Lot matching method (overrides a method named in a JSON input)
    #[arg(short, long, value_enum)]
    method: Option<MethodArg>,

    /// CSV column layout
    #[arg(long, value_enum, default_value_t = CsvFormatArg::Generic)]
    format: CsvFormatArg,

    /// Output the summary as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let calc = run_calculator(&self.file, self.format, self.method)?;
        let summary = calc.summary();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        } else {
            print_summary(&summary);
            Ok(())
        }
    }
}

fn print_summary(summary: &Summary) {
    println!();
    println!("CAPITAL GAINS SUMMARY ({})", summary.method);
    println!();
    println!(
        "  Transactions: {} | Sales matched: {}",
        summary.total_transactions, summary.total_sales
    );
    println!(
        "  Short-term: {} | Long-term: {} | Total: {}",
        format_usd_signed(summary.short_term_gain_loss),
        format_usd_signed(summary.long_term_gain_loss),
        format_usd_signed(summary.total_gain_loss)
    );
    println!();

    if !summary.realized_gains.is_empty() {
        let rows: Vec<GainRow> = summary.realized_gains.iter().map(GainRow::from).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("\u{26A0} {} data quality warning(s):", summary.warnings.len());
        for warning in &summary.warnings {
            println!("  - {}", warning_message(warning));
        }
        println!();
        println!("Unmatched quantities carry no cost basis; totals are incomplete.");
        println!();
    }
}

fn warning_message(warning: &Warning) -> String {
    match warning {
        Warning::NoCostBasis { symbol, quantity } => {
            format!("no cost basis for sell of {} {}", format_quantity(*quantity), symbol)
        }
        Warning::InsufficientLots {
            symbol,
            matched,
            unmatched,
        } => format!(
            "lots exhausted for {}: matched {}, unmatched {}",
            symbol,
            format_quantity(*matched),
            format_quantity(*unmatched)
        ),
    }
}

#[derive(Debug, Clone, Tabled)]
struct GainRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Sold")]
    sold: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Cost Basis")]
    cost_basis: String,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Gain/Loss")]
    gain_loss: String,
    #[tabled(rename = "Term")]
    term: String,
    #[tabled(rename = "Days")]
    days: String,
}

impl From<&crate::tax::RealizedGain> for GainRow {
    fn from(g: &crate::tax::RealizedGain) -> Self {
        GainRow {
            symbol: g.symbol.clone(),
            acquired: g.date_acquired.format("%Y-%m-%d").to_string(),
            sold: g.date_sold.format("%Y-%m-%d").to_string(),
            quantity: format_quantity(g.quantity),
            cost_basis: format_usd(g.cost_basis.round_dp(2)),
            proceeds: format_usd(g.proceeds.round_dp(2)),
            gain_loss: format_usd_signed(g.gain_loss.round_dp(2)),
            term: g.term.to_string(),
            days: g.days_held.to_string(),
        }
    }
}

fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount)
}

fn format_usd_signed(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

fn format_quantity(qty: Decimal) -> String {
    let s = format!("{:.8}", qty);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

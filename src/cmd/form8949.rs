//! Form 8949 command - plain-text sales and dispositions report

use crate::cmd::{run_calculator, CsvFormatArg, MethodArg};
use crate::tax::{Summary, Term};
use clap::Args;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct Form8949Command {
    /// Transactions file, CSV or JSON ("-" for CSV on stdin)
    #[arg(short, long)]
    file: PathBuf,

    /// Lot matching method (overrides a method named in a JSON input)
    #[arg(short, long, value_enum)]
    method: Option<MethodArg>,

    /// CSV column layout
    #[arg(long, value_enum, default_value_t = CsvFormatArg::Generic)]
    format: CsvFormatArg,

    /// Output path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Form8949Command {
    pub fn exec(&self) -> anyhow::Result<()> {
        let calc = run_calculator(&self.file, self.format, self.method)?;
        let summary = calc.summary();

        match &self.output {
            Some(path) => {
                let mut file = File::create(path)?;
                write_form_8949(&summary, &mut file)?;
                log::info!("wrote {}", path.display());
            }
            None => write_form_8949(&summary, &mut io::stdout().lock())?,
        }
        Ok(())
    }
}

fn write_form_8949<W: Write>(summary: &Summary, w: &mut W) -> io::Result<()> {
    writeln!(
        w,
        "FORM 8949 - Sales and Other Dispositions of Capital Assets"
    )?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;
    writeln!(w, "Cost Basis Method: {}", summary.method)?;
    writeln!(w)?;

    write_term_section(
        summary,
        Term::ShortTerm,
        "SHORT-TERM TRANSACTIONS (held 1 year or less)",
        w,
    )?;
    writeln!(
        w,
        "Short-term Total: ${:.2}",
        summary.short_term_gain_loss
    )?;
    writeln!(w)?;

    write_term_section(
        summary,
        Term::LongTerm,
        "LONG-TERM TRANSACTIONS (held more than 1 year)",
        w,
    )?;
    writeln!(w, "Long-term Total: ${:.2}", summary.long_term_gain_loss)?;
    writeln!(w)?;
    writeln!(w, "TOTAL GAIN/LOSS: ${:.2}", summary.total_gain_loss)?;
    Ok(())
}

fn write_term_section<W: Write>(
    summary: &Summary,
    term: Term,
    heading: &str,
    w: &mut W,
) -> io::Result<()> {
    writeln!(w, "{}", heading)?;
    writeln!(w, "{}", "-".repeat(80))?;

    for gain in summary.realized_gains.iter().filter(|g| g.term == term) {
        writeln!(
            w,
            "{:8} Acquired: {} Sold: {} Proceeds: ${:>12.2} Cost: ${:>12.2} Gain/Loss: ${:>12.2}",
            gain.symbol,
            gain.date_acquired.format("%m/%d/%Y"),
            gain.date_sold.format("%m/%d/%Y"),
            gain.proceeds,
            gain.cost_basis,
            gain.gain_loss
        )?;
    }
    writeln!(w)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::{Calculator, CostBasisMethod};
    use crate::transaction::RawTransaction;
    use rust_decimal_macros::dec;

    fn raw(date: &str, kind: &str, amount: rust_decimal::Decimal) -> RawTransaction {
        RawTransaction {
            date: date.to_string(),
            kind: kind.to_string(),
            amount,
            price: dec!(20000),
            symbol: "BTC".to_string(),
            fee: None,
        }
    }

    #[test]
    fn renders_both_sections_and_totals() {
        let mut calc = Calculator::new(CostBasisMethod::Fifo);
        calc.add_transaction(&raw("2022-01-01", "buy", dec!(1))).unwrap();
        calc.add_transaction(&raw("2023-06-01", "sell", dec!(0.5))).unwrap();

        let mut out = Vec::new();
        write_form_8949(&calc.summary(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("FORM 8949"));
        assert!(text.contains("Cost Basis Method: FIFO"));
        assert!(text.contains("SHORT-TERM TRANSACTIONS"));
        assert!(text.contains("LONG-TERM TRANSACTIONS"));
        assert!(text.contains("BTC"));
        assert!(text.contains("Acquired: 01/01/2022"));
        assert!(text.contains("TOTAL GAIN/LOSS: $"));
    }
}

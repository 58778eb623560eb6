pub mod form8949;
pub mod report;
pub mod sample;
pub mod schema;

use crate::import::{self, CsvFormat, RowError};
use crate::tax::{Calculator, CostBasisMethod};
use clap::ValueEnum;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum MethodArg {
    #[default]
    Fifo,
    Lifo,
}

impl From<MethodArg> for CostBasisMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Fifo => CostBasisMethod::Fifo,
            MethodArg::Lifo => CostBasisMethod::Lifo,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum CsvFormatArg {
    #[default]
    Generic,
    Coinbase,
}

impl From<CsvFormatArg> for CsvFormat {
    fn from(arg: CsvFormatArg) -> Self {
        match arg {
            CsvFormatArg::Generic => CsvFormat::Generic,
            CsvFormatArg::Coinbase => CsvFormat::Coinbase,
        }
    }
}

/// Load transactions from a CSV or JSON file (or stdin with "-") and run
/// them through a fresh calculator.
///
/// Method precedence: CLI flag, then the method named in a JSON input,
/// then FIFO. Rows that fail to parse or validate are logged with their
/// line numbers and skipped; the remaining rows still process.
pub fn run_calculator(
    path: &Path,
    format: CsvFormatArg,
    method: Option<MethodArg>,
) -> anyhow::Result<Calculator> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let reader = open_input(path)?;

    let (rows, mut errors, file_method) = if is_json {
        let input = import::read_json(reader)?;
        let rows = input
            .transactions
            .into_iter()
            .enumerate()
            .map(|(i, raw)| import::RawRow { line: i + 1, raw })
            .collect();
        (rows, Vec::new(), input.method)
    } else {
        let csv = import::read_csv(reader, format.into())?;
        (csv.rows, csv.errors, None)
    };

    let method = method
        .map(CostBasisMethod::from)
        .or(file_method)
        .unwrap_or_default();

    let mut calc = Calculator::new(method);
    for row in &rows {
        if let Err(error) = calc.add_transaction(&row.raw) {
            errors.push(RowError {
                line: row.line,
                error,
            });
        }
    }

    errors.sort_by_key(|e| e.line);
    for e in &errors {
        log::warn!("skipped row {}: {}", e.line, e.error);
    }

    Ok(calc)
}

fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        BufReader::new(io::stdin().lock()).read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        Ok(Box::new(io::Cursor::new(buffer)))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

//! Schema command - print expected input formats

use crate::import::CalculationInput;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the JSON input document
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(CalculationInput);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        println!("{}", CSV_COLUMNS.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("CSV Input Format (generic)");
        println!("==========================");
        println!();
        for (name, required, description) in CSV_FIELD_DESCRIPTIONS {
            let req = if *required { "required" } else { "optional" };
            println!("{:10} ({:8})  {}", name, req, description);
        }
        println!();
        println!("Coinbase exports are supported via --format coinbase");
        Ok(())
    }
}

const CSV_COLUMNS: &[&str] = &["date", "type", "amount", "price", "symbol", "fee"];

const CSV_FIELD_DESCRIPTIONS: &[(&str, bool, &str)] = &[
    (
        "date",
        true,
        "RFC 3339, 'YYYY-MM-DD HH:MM:SS', 'YYYY-MM-DD' or 'M/D/YYYY'",
    ),
    ("type", true, "'buy' or 'sell', case-insensitive"),
    ("amount", true, "units bought or sold, must be positive"),
    ("price", true, "price per unit, must not be negative"),
    ("symbol", true, "asset symbol, e.g. BTC"),
    ("fee", false, "exchange fee, defaults to 0"),
];

//! CSV input and CSV/JSON output for derived columns.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use rollstat_config::{InputConfig, OutputFormat};

/// Named numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// The primary series and, when configured, the series it is paired with.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub primary: Column,
    pub paired: Option<Column>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.primary.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.values.is_empty()
    }
}

/// Reads the configured columns from a CSV file with a header row.
pub fn read_csv(path: &Path, input: &InputConfig) -> Result<Dataset> {
    let file =
        File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
    read_csv_from(file, input).with_context(|| format!("failed to read {}", path.display()))
}

/// Reads the configured columns from any CSV source.
pub fn read_csv_from<R: io::Read>(source: R, input: &InputConfig) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .delimiter(input.delimiter_byte()?)
        .trim(Trim::All)
        .from_reader(source);
    let headers = reader.headers().context("missing header row")?.clone();
    let primary_index = header_index(&headers, &input.column)?;
    let paired_index = input
        .paired_column
        .as_deref()
        .map(|name| header_index(&headers, name))
        .transpose()?;

    let mut primary = Vec::new();
    let mut paired = Vec::new();
    for (row, record) in reader.records().enumerate() {
        // Row numbers count the header as line 1.
        let line = row + 2;
        let record = record.with_context(|| format!("malformed record on line {line}"))?;
        primary.push(parse_field(&record, primary_index, &input.column, line)?);
        if let (Some(index), Some(name)) = (paired_index, input.paired_column.as_deref()) {
            paired.push(parse_field(&record, index, name, line)?);
        }
    }
    debug!(rows = primary.len(), column = %input.column, "loaded input column");

    Ok(Dataset {
        primary: Column::new(input.column.clone(), primary),
        paired: input
            .paired_column
            .as_ref()
            .map(|name| Column::new(name.clone(), paired)),
    })
}

fn header_index(headers: &StringRecord, name: &str) -> Result<usize> {
    match headers.iter().position(|header| header == name) {
        Some(index) => Ok(index),
        None => bail!(
            "column {name:?} not found; available columns: {}",
            headers.iter().collect::<Vec<_>>().join(", ")
        ),
    }
}

fn parse_field(record: &StringRecord, index: usize, name: &str, line: usize) -> Result<f64> {
    let raw = record
        .get(index)
        .with_context(|| format!("line {line} has no {name:?} field"))?;
    let value = raw
        .parse::<f64>()
        .with_context(|| format!("line {line}: {name:?} value {raw:?} is not a number"))?;
    ensure!(
        value.is_finite(),
        "line {line}: {name:?} value {raw:?} is not finite"
    );
    Ok(value)
}

/// Picks the encoding from the output extension, falling back to `configured`.
pub fn resolve_format(path: Option<&Path>, configured: OutputFormat) -> OutputFormat {
    let extension = path
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => OutputFormat::Json,
        Some("csv") => OutputFormat::Csv,
        _ => configured,
    }
}

/// Writes `columns` to `path`, or stdout when no path is given.
pub fn write_output(
    path: Option<&Path>,
    format: OutputFormat,
    columns: &[Column],
    precision: Option<usize>,
) -> Result<()> {
    let writer: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("failed to create output {}", path.display())
        })?)),
        None => Box::new(io::stdout().lock()),
    };
    match format {
        OutputFormat::Csv => write_csv(writer, columns, precision),
        OutputFormat::Json => write_json(writer, columns),
    }
}

/// Writes equal-length columns as CSV with a header row.
pub fn write_csv<W: Write>(writer: W, columns: &[Column], precision: Option<usize>) -> Result<()> {
    let rows = row_count(columns)?;
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer
        .write_record(columns.iter().map(|column| column.name.as_str()))
        .context("failed to write CSV header")?;
    for row in 0..rows {
        writer
            .write_record(
                columns
                    .iter()
                    .map(|column| format_value(column.values[row], precision)),
            )
            .with_context(|| format!("failed to write CSV row {row}"))?;
    }
    writer.flush().context("failed to flush CSV output")?;
    Ok(())
}

/// Writes columns as one JSON object, keys in column order.
pub fn write_json<W: Write>(mut writer: W, columns: &[Column]) -> Result<()> {
    row_count(columns)?;
    serde_json::to_writer_pretty(&mut writer, &OrderedColumns(columns))
        .context("failed to encode JSON output")?;
    writeln!(writer).context("failed to write JSON output")?;
    writer.flush().context("failed to flush JSON output")?;
    Ok(())
}

fn row_count(columns: &[Column]) -> Result<usize> {
    let rows = columns.first().map_or(0, |column| column.values.len());
    for column in columns {
        ensure!(
            column.values.len() == rows,
            "column {:?} has {} rows, expected {rows}",
            column.name,
            column.values.len()
        );
    }
    Ok(rows)
}

fn format_value(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(digits) => format!("{value:.digits$}"),
        None => value.to_string(),
    }
}

struct OrderedColumns<'a>(&'a [Column]);

impl Serialize for OrderedColumns<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for column in self.0 {
            map.serialize_entry(&column.name, &column.values)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(paired: Option<&str>) -> InputConfig {
        InputConfig {
            paired_column: paired.map(str::to_string),
            ..InputConfig::default()
        }
    }

    #[test]
    fn reads_named_columns() {
        let raw = "date,close,volume\n2024-01-01, 10.5 ,100\n2024-01-02,11,250\n";
        let dataset = read_csv_from(raw.as_bytes(), &input(Some("volume"))).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.primary.values, vec![10.5, 11.0]);
        assert_eq!(dataset.paired.unwrap().values, vec![100.0, 250.0]);
    }

    #[test]
    fn reports_missing_columns_and_bad_numbers() {
        let err = read_csv_from("open\n1\n".as_bytes(), &input(None)).unwrap_err();
        assert!(err.to_string().contains("\"close\" not found"));

        let err = read_csv_from("close\n1\nabc\n".as_bytes(), &input(None)).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn rejects_non_finite_fields_with_their_line() {
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            let body = format!("close\n1\n{raw}\n2\n");
            let err = read_csv_from(body.as_bytes(), &input(None)).unwrap_err();
            let message = err.to_string();
            assert!(message.contains("line 3"), "{message}");
            assert!(message.contains("not finite"), "{message}");
        }

        let err = read_csv_from(
            "close,volume\n1,2\n3,4\n5,NaN\n".as_bytes(),
            &input(Some("volume")),
        )
        .unwrap_err();
        assert!(err.to_string().contains("line 4: \"volume\""));
    }

    #[test]
    fn honours_custom_delimiters() {
        let config = InputConfig {
            delimiter: ";".to_string(),
            ..InputConfig::default()
        };
        let dataset = read_csv_from("close;open\n1;2\n".as_bytes(), &config).unwrap();
        assert_eq!(dataset.primary.values, vec![1.0]);
    }

    #[test]
    fn writes_csv_with_optional_precision() {
        let columns = [
            Column::new("close", vec![10.0, 11.0]),
            Column::new("average_2", vec![10.0, 10.5]),
        ];
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &columns, None).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "close,average_2\n10,10\n11,10.5\n"
        );

        let mut buffer = Vec::new();
        write_csv(&mut buffer, &columns, Some(2)).unwrap();
        assert!(String::from_utf8(buffer).unwrap().ends_with("11.00,10.50\n"));
    }

    #[test]
    fn json_keeps_column_order() {
        let columns = [
            Column::new("zeta", vec![1.0]),
            Column::new("alpha", vec![2.0]),
        ];
        let mut buffer = Vec::new();
        write_json(&mut buffer, &columns).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }

    #[test]
    fn rejects_ragged_columns() {
        let columns = [Column::new("a", vec![1.0]), Column::new("b", vec![])];
        assert!(write_csv(Vec::new(), &columns, None).is_err());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            resolve_format(Some(Path::new("out.JSON")), OutputFormat::Csv),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(Some(Path::new("out.txt")), OutputFormat::Json),
            OutputFormat::Json
        );
        assert_eq!(resolve_format(None, OutputFormat::Csv), OutputFormat::Csv);
    }
}

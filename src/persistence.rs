//! The big-endian table-file codec (spec §6), for numeric-only tables:
//!
//! ```text
//! 0..6      magic "RMBelt" (ASCII)
//! 6         major version = 0
//! 7         minor version = 1
//! 8..12     width W (int32)
//! 12..16    height H (int32)
//! 16..16+4W column type ids, int32 ordinals
//! ..+4W     column label byte-lengths, int32
//! then      concatenated UTF-8 label bytes
//! then      W * H * 8 bytes of column-major f64 payloads, big-endian
//! ```
//!
//! Mapped numeric columns materialize through their permutation on write,
//! emitting `NaN` for out-of-range entries. Non-numeric columns are not
//! persistable by this codec.

use std::io::{Read, Write};

use crate::column::{Column, ColumnCategory, ColumnType, ColumnTypeId};
use crate::error::Error;
use crate::table::Table;

const MAGIC: &[u8; 6] = b"RMBelt";
const MAJOR_VERSION: u8 = 0;
const MINOR_VERSION: u8 = 1;

fn type_id_ordinal(id: ColumnTypeId) -> i32 {
    match id {
        ColumnTypeId::Real => 0,
        ColumnTypeId::Integer => 1,
        ColumnTypeId::Nominal => 2,
        ColumnTypeId::DateTime => 3,
        ColumnTypeId::Time => 4,
        ColumnTypeId::Custom => 5,
    }
}

fn type_id_from_ordinal(ordinal: i32) -> Result<ColumnTypeId, Error> {
    match ordinal {
        0 => Ok(ColumnTypeId::Real),
        1 => Ok(ColumnTypeId::Integer),
        2 => Ok(ColumnTypeId::Nominal),
        3 => Ok(ColumnTypeId::DateTime),
        4 => Ok(ColumnTypeId::Time),
        5 => Ok(ColumnTypeId::Custom),
        other => Err(Error::invalid_format(format!("unrecognized column type ordinal {other}"))),
    }
}

/// Writes every numeric-readable column of `table` to `writer` in the
/// bit-exact format described at module level. Fails with
/// `unsupported-operation` if `table` holds a non-numeric column (the
/// caller is expected to have already selected only persistable columns,
/// e.g. via `table.select().of_category(ColumnCategory::Numeric)`).
pub fn write_table<W: Write>(table: &Table, writer: &mut W) -> Result<(), Error> {
    let width = table.width();
    let height = table.height();
    log::debug!("writing table file: width={width} height={height}");

    for column in table.columns() {
        if column.column_type().category != ColumnCategory::Numeric {
            return Err(Error::unsupported_operation(
                "only numeric-readable column types can be persisted by this codec",
            ));
        }
    }

    writer.write_all(MAGIC)?;
    writer.write_all(&[MAJOR_VERSION, MINOR_VERSION])?;
    writer.write_all(&(width as i32).to_be_bytes())?;
    writer.write_all(&(height as i32).to_be_bytes())?;

    for column in table.columns() {
        writer.write_all(&type_id_ordinal(column.column_type().id).to_be_bytes())?;
    }
    let labels = table.labels();
    for label in labels {
        writer.write_all(&(label.len() as i32).to_be_bytes())?;
    }
    for label in labels {
        writer.write_all(label.as_bytes())?;
    }

    let mut values = vec![0.0f64; height];
    for column in table.columns() {
        column.fill_f64(&mut values, 0);
        for &v in &values {
            writer.write_all(&v.to_be_bytes())?;
        }
    }
    Ok(())
}

/// A persisted table: column-major `f64` payloads plus the type and label
/// metadata read from the header. Each column is a plain `Vec<f64>`, not a
/// [`Column`] — callers rebuild columns (e.g. via a `NumericBuffer`) with
/// the type information this carries.
pub struct PersistedTable {
    pub width: usize,
    pub height: usize,
    pub column_type_ids: Vec<ColumnTypeId>,
    pub labels: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

/// Reads a table file written by [`write_table`]. The header must match
/// exactly (magic, version); any mismatch or truncation fails with
/// `invalid-format`.
pub fn read_table<R: Read>(reader: &mut R) -> Result<PersistedTable, Error> {
    let mut magic = [0u8; 6];
    read_exact(reader, &mut magic)?;
    if &magic != MAGIC {
        return Err(Error::invalid_format("bad magic bytes"));
    }
    let mut version = [0u8; 2];
    read_exact(reader, &mut version)?;
    if version[0] != MAJOR_VERSION || version[1] != MINOR_VERSION {
        return Err(Error::invalid_format(format!(
            "unsupported version {}.{}",
            version[0], version[1]
        )));
    }
    let width = read_i32(reader)? as usize;
    let height = read_i32(reader)? as usize;
    log::debug!("reading table file: width={width} height={height}");

    let mut column_type_ids = Vec::with_capacity(width);
    for _ in 0..width {
        column_type_ids.push(type_id_from_ordinal(read_i32(reader)?)?);
    }
    let mut label_lengths = Vec::with_capacity(width);
    for _ in 0..width {
        let len = read_i32(reader)?;
        if len < 0 {
            return Err(Error::invalid_format("negative column label length"));
        }
        label_lengths.push(len as usize);
    }
    let mut labels = Vec::with_capacity(width);
    for &len in &label_lengths {
        let mut bytes = vec![0u8; len];
        read_exact(reader, &mut bytes)?;
        labels.push(String::from_utf8(bytes).map_err(|_| Error::invalid_format("column label is not valid UTF-8"))?);
    }

    let mut columns = Vec::with_capacity(width);
    for _ in 0..width {
        let mut values = Vec::with_capacity(height);
        for _ in 0..height {
            values.push(read_f64(reader)?);
        }
        columns.push(values);
    }

    Ok(PersistedTable {
        width,
        height,
        column_type_ids,
        labels,
        columns,
    })
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::invalid_format("unexpected end of file")
        } else {
            Error::Io(e)
        }
    })
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32, Error> {
    let mut buf = [0u8; 4];
    read_exact(reader, &mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_f64<R: Read>(reader: &mut R) -> Result<f64, Error> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf)?;
    Ok(f64::from_be_bytes(buf))
}

/// Rebuilds a plain dense-numeric [`Column`] from one of
/// [`PersistedTable::columns`]'s entries, using the recorded type id.
pub fn column_from_persisted(values: Vec<f64>, type_id: ColumnTypeId) -> Column {
    use crate::column::DenseNumericColumn;
    let column_type = match type_id {
        ColumnTypeId::Integer => ColumnType::integer(),
        ColumnTypeId::DateTime => ColumnType::date_time(),
        ColumnTypeId::Time => ColumnType::time(),
        _ => ColumnType::real(),
    };
    Column::DenseNumeric(DenseNumericColumn::new(values, column_type))
}

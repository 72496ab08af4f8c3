//! CSV reading helpers with encoding-aware field decoding.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader(path: &Path) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).double_quote(true).flexible(false);
    Ok(builder.from_reader(BufReader::new(file)))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: std::io::Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{Result, ScreenError};

pub const CID_TAG: &str = "PUBCHEM_COMPOUND_CID";
const RECORD_END: &str = "$$$$";
const MOL_BLOCK_END: &str = "M  END";

/// One `$$$$`-terminated SDF record.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfRecord {
    pub title: String,
    pub mol_block: String,
    pub data: Vec<(String, String)>,
}

impl SdfRecord {
    pub fn data_item(&self, tag: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// The compound identifier: PubChem CID data item, falling back to the title line.
    pub fn source_id(&self) -> &str {
        self.data_item(CID_TAG)
            .unwrap_or(self.title.as_str())
            .trim()
    }
}

/// Streams records out of an SDF. A record containing invalid UTF-8 yields an
/// `InvalidData` error and the stream carries on with the next record; any
/// other read error ends the stream.
pub struct SdfRecords<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    invalid_utf8: bool,
    done: bool,
}

impl<R: BufRead> SdfRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
            invalid_utf8: false,
            done: false,
        }
    }

    fn next_line(&mut self, line: &mut String) -> std::io::Result<bool> {
        self.buf.clear();
        let n = self.reader.read_until(b'\n', &mut self.buf)?;
        if n == 0 {
            return Ok(false);
        }
        self.line_no += 1;

        line.clear();
        match std::str::from_utf8(&self.buf) {
            Ok(text) => line.push_str(text),
            Err(_) => {
                self.invalid_utf8 = true;
                line.push_str(&String::from_utf8_lossy(&self.buf));
            }
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(true)
    }

    fn read_record(&mut self) -> std::io::Result<Option<SdfRecord>> {
        self.invalid_utf8 = false;
        let mut line = String::new();
        let mut mol_block = String::new();
        let mut data = Vec::new();
        let mut in_mol_block = true;
        let mut pending_tag: Option<(String, Vec<String>)> = None;
        let mut saw_any = false;

        loop {
            if !self.next_line(&mut line)? {
                if saw_any && !mol_block.trim().is_empty() {
                    log::warn!("SDF stream ended without a record terminator");
                    break;
                }
                return Ok(None);
            }
            saw_any = true;

            if line == RECORD_END {
                break;
            }

            if in_mol_block {
                mol_block.push_str(&line);
                mol_block.push('\n');
                if line.starts_with(MOL_BLOCK_END) {
                    in_mol_block = false;
                }
                continue;
            }

            if line.starts_with('>') {
                if let Some((tag, values)) = pending_tag.take() {
                    data.push((tag, values.join("\n")));
                }
                let tag = line
                    .split_once('<')
                    .and_then(|(_, rest)| rest.split_once('>'))
                    .map(|(tag, _)| tag.to_string())
                    .unwrap_or_default();
                pending_tag = Some((tag, Vec::new()));
            } else if line.is_empty() {
                if let Some((tag, values)) = pending_tag.take() {
                    data.push((tag, values.join("\n")));
                }
            } else if let Some((_, values)) = pending_tag.as_mut() {
                values.push(line.clone());
            }
        }

        if let Some((tag, values)) = pending_tag.take() {
            data.push((tag, values.join("\n")));
        }

        if self.invalid_utf8 {
            return Err(std::io::Error::new(
                ErrorKind::InvalidData,
                "record is not valid UTF-8",
            ));
        }

        let title = mol_block.lines().next().unwrap_or_default().trim().to_string();
        Ok(Some(SdfRecord {
            title,
            mol_block,
            data,
        }))
    }
}

impl<R: BufRead> Iterator for SdfRecords<R> {
    type Item = std::io::Result<SdfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                if e.kind() != ErrorKind::InvalidData {
                    self.done = true;
                }
                Some(Err(std::io::Error::new(
                    e.kind(),
                    format!("line {}: {}", self.line_no, e),
                )))
            }
        }
    }
}

/// Opens a plain or gzip-compressed (`.gz`) SDF file for streaming.
pub fn open_sdf(path: impl AsRef<Path>) -> Result<SdfRecords<Box<dyn BufRead>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ScreenError::io(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    log::info!("reading {:?}", path);

    Ok(SdfRecords::new(reader))
}

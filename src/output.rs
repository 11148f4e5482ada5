use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, ScreenError};

/// Writes `value` as JSON indented with four spaces.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ScreenError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| ScreenError::json(path, e))?;

    writer.flush().map_err(|e| ScreenError::io(path, e))?;
    log::debug!("wrote {:?}", path);
    Ok(())
}

/// One SMILES per line, newline terminated.
pub fn write_smiles<S: AsRef<str>>(smiles: &[S], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ScreenError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    for smi in smiles {
        writeln!(writer, "{}", smi.as_ref()).map_err(|e| ScreenError::io(path, e))?;
    }

    writer.flush().map_err(|e| ScreenError::io(path, e))?;
    log::debug!("wrote {} SMILES to {:?}", smiles.len(), path);
    Ok(())
}

pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| ScreenError::io(path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempdir::TempDir;

    #[test]
    fn test_write_json_four_space_indent() {
        let dir = TempDir::new("output").unwrap();
        let path = dir.path().join("out.json");
        let value = BTreeMap::from([("[#7]".to_string(), vec!["CN".to_string()])]);

        write_json(&value, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n    \"[#7]\": [\n        \"CN\"\n    ]\n}");
    }

    #[test]
    fn test_write_smiles() {
        let dir = TempDir::new("output").unwrap();
        let path = dir.path().join("out.smi");

        write_smiles(&["CCO", "c1ccccc1"][..], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "CCO\nc1ccccc1\n");
    }
}

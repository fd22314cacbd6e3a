//! Reading and writing of `kpsym` files.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{self, format_err};
use bincode;
use serde::{de::DeserializeOwned, Serialize};
use serde_yaml;

pub(crate) mod format;


/// An enumerated type for `kpsym` file types.
pub enum KPSymFileType {
    /// Variant for binary files containing irreducible-Brillouin-zone construction results.
    Ibz,
}

impl KPSymFileType {
    /// Returns the extension of the file type.
    pub fn ext(&self) -> String {
        match self {
            KPSymFileType::Ibz => "kpsym.ibz".to_string(),
        }
    }
}

/// Reads a `kpsym` binary file and deserialises it into an appropriate structure.
///
/// # Arguments
///
/// * `name` - The name of the file to be read in (without `kpsym`-specific extensions).
/// * `file_type` - The type of the `kpsym` file to be read in.
///
/// # Returns
///
/// A `Result` containing the structure deserialised from the read-in file.
pub fn read_kpsym_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: KPSymFileType,
) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut reader = BufReader::new(File::open(path).map_err(|err| format_err!(err))?);
    bincode::deserialize_from(&mut reader).map_err(|err| format_err!(err))
}

/// Serialises a structure and writes into a `kpsym` binary file.
///
/// # Arguments
///
/// * `name` - The name of the file to be written (without `kpsym`-specific extensions).
/// * `file_type` - The type of the `kpsym` file to be written.
/// * `value` - The structure to be serialised.
pub fn write_kpsym_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: KPSymFileType,
    value: &T,
) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, value).map_err(|err| format_err!(err))
}

/// Reads a `kpsym` input YAML file and deserialises it into an appropriate structure.
///
/// # Arguments
///
/// * `name` - The name of the file to be read in (with its `.yml` or `.yaml` extension).
pub fn read_kpsym_yaml<T, P: AsRef<Path>>(name: P) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut reader = BufReader::new(File::open(name).map_err(|err| format_err!(err))?);
    serde_yaml::from_reader(&mut reader).map_err(|err| format_err!(err))
}

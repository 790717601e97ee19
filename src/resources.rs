use std::{fs::File, io::Read, path::Path};

use crate::RomError;

#[derive(Clone, Debug, PartialEq)]
/// Represents a single rom with it's information
pub struct Rom {
    /// The rom name
    name: String,
    /// The raw big endian opcodes, without any header
    data: Box<[u8]>,
}

impl Rom {
    /// Will generate a new rom based of the given data
    pub fn new(name: &str, data: &[u8]) -> Self {
        Rom {
            name: name.to_string(),
            data: data.into(),
        }
    }

    /// Reads the whole reader into a rom.
    pub fn from_reader<R: Read>(name: &str, mut reader: R) -> Result<Self, RomError> {
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|source| RomError::Io {
                name: name.to_string(),
                source,
            })?;
        log::debug!("Read rom '{}' with {} bytes", name, data.len());
        Ok(Rom {
            name: name.to_string(),
            data: data.into_boxed_slice(),
        })
    }

    /// Reads the rom from the file system, the rom is named after the file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path).map_err(|source| RomError::Io {
            name: name.clone(),
            source,
        })?;
        Self::from_reader(&name, file)
    }

    /// Will return a slice internal values of the given data
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Will return the name of the rom.
    pub fn get_name(&self) -> &str {
        &self.name
    }
}

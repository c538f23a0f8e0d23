use anyhow::Result;
use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::str::FromStr;

use crate::LmError;

/// Text encoding of model, lattice and output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Utf8,
    Latin1,
}

impl Codec {
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Utf8 => "utf-8",
            Codec::Latin1 => "latin-1",
        }
    }

    /// Open a file for line-by-line reading.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn BufRead>> {
        let fh = File::open(path)?;
        Ok(match self {
            Codec::Utf8 => Box::new(BufReader::new(fh)),
            Codec::Latin1 => {
                // Every byte is a code point, but the lines still have to be
                // valid UTF-8 for `BufRead::lines`
                let mut bytes = Vec::new();
                BufReader::new(fh).read_to_end(&mut bytes)?;
                let text: String = bytes.into_iter().map(char::from).collect();
                Box::new(Cursor::new(text.into_bytes()))
            }
        })
    }

    /// Encode output text.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>> {
        match self {
            Codec::Utf8 => Ok(Cow::Borrowed(text.as_bytes())),
            Codec::Latin1 => {
                let mut bytes = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    let byte = u8::try_from(u32::from(ch)).map_err(|_| LmError::Unencodable {
                        codec: self.name(),
                        ch,
                    })?;
                    bytes.push(byte);
                }
                Ok(Cow::Owned(bytes))
            }
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Codec {
    type Err = LmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Codec::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(Codec::Latin1),
            _ => Err(LmError::UnknownCodec(s.to_string())),
        }
    }
}

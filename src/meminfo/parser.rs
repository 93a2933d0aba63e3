//! Parser for the single-value-per-line meminfo format.
//!
//! Format: `Key: value[ unit]`, e.g.
//!
//! ```text
//! MemTotal:       16314324 kB
//! HugePages_Total:       0
//! ```

use std::collections::HashMap;
use std::io::BufRead;

use super::canonical::KeyCanonicalizer;
use super::error::{MeminfoError, Result};

/// Multiplier for values reported in kB.
pub const KB: f64 = 1024.0;

/// Parses `/proc/meminfo` style streams into canonical key -> value.
#[derive(Debug, Clone, Default)]
pub struct MeminfoParser {
    canonicalizer: KeyCanonicalizer,
}

impl MeminfoParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the whole stream. A single malformed line aborts the parse and
    /// nothing is returned for the stream. Later duplicates of a key
    /// overwrite earlier ones.
    ///
    /// `source_name` only appears in error messages.
    pub fn parse<R: BufRead>(&self, reader: R, source_name: &str) -> Result<HashMap<String, f64>> {
        let mut mem_info = HashMap::new();

        for line in reader.lines() {
            let line = line.map_err(|e| MeminfoError::io(source_name, e))?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            // Some kernels (CentOS 6.2, 3.10.90) emit empty lines.
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 2 {
                return Err(MeminfoError::invalid_line(source_name, &line));
            }

            let mut value = parts[1]
                .parse::<f64>()
                .map_err(|_| MeminfoError::invalid_value(source_name, parts[1]))?;

            let mut key = self.canonicalizer.canonicalize(parts[0]);

            match parts.len() {
                2 => {}
                // Unit is always kB when present.
                3 => {
                    value *= KB;
                    key.push_str("_bytes");
                }
                _ => return Err(MeminfoError::invalid_line(source_name, &line)),
            }

            mem_info.insert(key, value);
        }

        Ok(mem_info)
    }
}

//! IO for test pattern files
//!
//! One pattern per line, with an optional index and one character per input:
//! ```text
//!     1: 00011101
//!     2: 01X10000
//! ```
//! X marks an unknown value.

use std::io::{BufRead, BufReader, Read, Write};

use crate::error::{Error, Result};

/// Read patterns; X is read as None
pub fn read_patterns<R: Read>(r: R) -> Result<Vec<Vec<Option<bool>>>> {
    let mut ret = Vec::new();
    for (i, l) in BufReader::new(r).lines().enumerate() {
        let s = l?;
        let t = s.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        let bits = match t.split_once(':') {
            Some((_, b)) => b,
            None => t,
        };
        let pattern = bits
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| match c {
                '0' => Ok(Some(false)),
                '1' => Ok(Some(true)),
                'x' | 'X' => Ok(None),
                _ => Err(Error::Parse {
                    line: i + 1,
                    message: format!("unexpected character {c} in pattern"),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        ret.push(pattern);
    }
    Ok(ret)
}

/// Write patterns, one per line; None is written as X
pub fn write_patterns<W: Write>(w: &mut W, patterns: &[Vec<Option<bool>>]) -> Result<()> {
    for (i, p) in patterns.iter().enumerate() {
        let bits: String = p
            .iter()
            .map(|b| match b {
                Some(false) => '0',
                Some(true) => '1',
                None => 'X',
            })
            .collect();
        writeln!(w, "{}: {}", i + 1, bits)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read() {
        let text = "# Patterns\n1: 0110\n\n2: 1X0 1\n0000\n";
        let patterns = read_patterns(text.as_bytes()).unwrap();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[1], vec![Some(true), None, Some(false), Some(true)]);
        assert_eq!(patterns[2], vec![Some(false); 4]);
        assert!(matches!(
            read_patterns("1: 01\n2: 0a\n".as_bytes()),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_write() {
        let mut buf = Vec::new();
        write_patterns(&mut buf, &[vec![Some(true), None], vec![Some(false), Some(false)]])
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1: 1X\n2: 00\n");
    }
}

use crate::buffer::ByteBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternToken {
    Byte(u8),
    Wildcard,
    SkipRun,
}

/// Token sequence compiled from a pattern string of two-character tokens:
/// hex digits for an exact byte, `??` for any byte, `..` for any run of
/// bytes. Whitespace between tokens is ignored. Anything else compiles to an
/// empty pattern, which never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledPattern {
    tokens: Vec<PatternToken>,
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> Self {
        let mut chars = pattern.chars().filter(|c| !c.is_whitespace());
        let mut tokens = Vec::new();

        while let Some(hi) = chars.next() {
            let Some(lo) = chars.next() else {
                return Self::default();
            };
            let token = match (hi, lo) {
                ('?', '?') => PatternToken::Wildcard,
                ('.', '.') => PatternToken::SkipRun,
                _ => match (hex_value(hi), hex_value(lo)) {
                    (Some(h), Some(l)) => PatternToken::Byte((h << 4) | l),
                    _ => return Self::default(),
                },
            };
            tokens.push(token);
        }

        Self { tokens }
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    pub fn is_valid(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// The exact bytes this pattern denotes, if it has no wildcards
    pub fn literal_bytes(&self) -> Option<Vec<u8>> {
        if !self.is_valid() {
            return None;
        }
        self.tokens
            .iter()
            .map(|t| match t {
                PatternToken::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Try to match anchored at `start`; returns the number of bytes consumed.
    pub fn match_at(&self, buffer: &dyn ByteBuffer, start: usize) -> Option<usize> {
        let len = buffer.len();
        if len == 0 || !self.is_valid() {
            return None;
        }

        let tokens = &self.tokens;
        let (mut ppos, mut dpos) = (0, start);
        // Backtrack point: (token index of the last skip run, data position)
        let mut backtrack: Option<(usize, usize)> = None;

        while ppos < tokens.len() {
            if dpos >= len {
                // Trailing skip runs match the empty remainder.
                if tokens[ppos..].iter().all(|t| *t == PatternToken::SkipRun) {
                    break;
                }
                return None;
            }

            match tokens[ppos] {
                PatternToken::SkipRun => {
                    backtrack = Some((ppos, dpos));
                    ppos += 1;
                }
                PatternToken::Wildcard => {
                    ppos += 1;
                    dpos += 1;
                }
                PatternToken::Byte(b) if buffer.at(dpos) == Some(b) => {
                    ppos += 1;
                    dpos += 1;
                }
                PatternToken::Byte(_) => {
                    let (skip, matched) = backtrack?;
                    backtrack = Some((skip, matched + 1));
                    ppos = skip + 1;
                    dpos = matched + 1;
                }
            }
        }

        Some(dpos - start)
    }
}

/// True when `pattern` compiles to a usable pattern
pub fn check_pattern(pattern: &str) -> bool {
    CompiledPattern::compile(pattern).is_valid()
}

fn hex_value(c: char) -> Option<u8> {
    c.to_digit(16).map(|d| d as u8)
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Lowercase hex rendering of `bytes`, optionally separated by `sep`
pub fn to_hex(bytes: &[u8], sep: Option<char>) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            if let Some(sep) = sep {
                out.push(sep);
            }
        }
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;

    fn buffer(bytes: &[u8]) -> MemoryBuffer {
        MemoryBuffer::from_bytes(bytes.to_vec())
    }

    #[test]
    fn test_compile_tokens() {
        let p = CompiledPattern::compile("de ?? be ..");
        assert_eq!(
            p.tokens(),
            &[
                PatternToken::Byte(0xDE),
                PatternToken::Wildcard,
                PatternToken::Byte(0xBE),
                PatternToken::SkipRun,
            ]
        );
    }

    #[test]
    fn test_compile_invalid() {
        assert!(!CompiledPattern::compile("ZZ").is_valid());
        assert!(!CompiledPattern::compile("DEA").is_valid());
        assert!(!CompiledPattern::compile("DE?.").is_valid());
        assert!(!CompiledPattern::compile("").is_valid());
        assert!(check_pattern("  0a  0B  "));
    }

    #[test]
    fn test_match_trailing_skip_run() {
        let data = buffer(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11]);
        let p = CompiledPattern::compile("DE??BE..");
        assert_eq!(p.match_at(&data, 0), Some(3));
        assert_eq!(p.match_at(&data, 1), None);
    }

    #[test]
    fn test_match_backtracks_over_skip_run() {
        let data = buffer(&[0x01, 0xAA, 0x02, 0xAA, 0x03]);
        let p = CompiledPattern::compile("01 .. AA 03");
        assert_eq!(p.match_at(&data, 0), Some(5));
        let p = CompiledPattern::compile("01 .. AA 04");
        assert_eq!(p.match_at(&data, 0), None);
    }

    #[test]
    fn test_trailing_skip_run_at_end_of_data() {
        let data = buffer(&[0xDE, 0xAD, 0xBE]);
        assert_eq!(CompiledPattern::compile("DE??BE....").match_at(&data, 0), Some(3));
    }

    #[test]
    fn test_match_runs_out_of_data() {
        let data = buffer(&[0xDE, 0xAD]);
        assert_eq!(CompiledPattern::compile("DEADBE").match_at(&data, 0), None);
    }

    #[test]
    fn test_literal_bytes() {
        assert_eq!(CompiledPattern::compile("0102").literal_bytes(), Some(vec![1, 2]));
        assert_eq!(CompiledPattern::compile("01??").literal_bytes(), None);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0xDE, 0xAD, 0x01], None), "dead01");
        assert_eq!(to_hex(&[0xDE, 0xAD], Some(' ')), "de ad");
        assert_eq!(to_hex(&[], Some(' ')), "");
    }
}

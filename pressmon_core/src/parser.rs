//! Raw backend tokens -> validated channel readings.
//!
//! - `SerialLineParser` reads one MCU reply line (`CH0: n | CH1: n | ...`),
//!   applies the CH0 presence gate and converts CH1..CH4 to physical units.
//! - `OcrTextParser` repairs one OCR text fragment with a `DisplayPolicy`
//!   and validates it as a decimal number.

use crate::error::ParseError;
use crate::units::UnitConverter;

/// Fields a serial line must carry: the presence sentinel plus four channels.
pub const SERIAL_FIELDS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct SerialLineParser {
    converter: UnitConverter,
    presence_gate: i64,
}

impl Default for SerialLineParser {
    fn default() -> Self {
        Self::new(UnitConverter::default(), 1000)
    }
}

impl SerialLineParser {
    pub fn new(converter: UnitConverter, presence_gate: i64) -> Self {
        Self {
            converter,
            presence_gate,
        }
    }

    /// Parse one reply line.
    ///
    /// Returns `Ok(None)` when CH0 is above the presence gate: the line is
    /// well formed but carries no physical data. Fields after the fifth are
    /// ignored.
    pub fn parse(&self, line: &str) -> Result<Option<Vec<f64>>, ParseError> {
        let mut counts = Vec::with_capacity(SERIAL_FIELDS);
        for field in line.split('|') {
            let value = field
                .split(':')
                .nth(1)
                .map(str::trim)
                .and_then(|v| v.parse::<i64>().ok())
                .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;
            counts.push(value);
            if counts.len() == SERIAL_FIELDS {
                break;
            }
        }
        if counts.len() < SERIAL_FIELDS {
            return Err(ParseError::MalformedLine(line.to_string()));
        }
        if counts[0] > self.presence_gate {
            return Ok(None);
        }
        Ok(Some(
            counts[1..]
                .iter()
                .map(|&c| self.converter.adc_to_physical(c as f64))
                .collect(),
        ))
    }
}

/// How a particular instrument display looks to the OCR model.
///
/// Implementations decide which glyphs are misreads of which digits and
/// where the display's decimal point belongs once OCR has dropped it.
pub trait DisplayPolicy: Send + Sync {
    /// Replace a glyph with the character it most likely is.
    fn correct(&self, glyph: char) -> char;

    /// Put the decimal point back into a string of corrected digits.
    fn place_point(&self, digits: String) -> String;
}

/// Seven-segment display with two decimals: `105` is `1.05`, `2050` is `20.50`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPointDisplay;

impl DisplayPolicy for FixedPointDisplay {
    fn correct(&self, glyph: char) -> char {
        match glyph {
            'o' | 'O' | 'Q' | 'D' => '0',
            'l' | 'I' | 'i' | 'L' | 'J' => '1',
            'z' | 'Z' => '2',
            's' | 'S' => '5',
            'G' => '6',
            't' | 'T' => '7',
            'B' => '8',
            'q' => '9',
            other => other,
        }
    }

    fn place_point(&self, digits: String) -> String {
        // Slicing below is by byte; anything non-ASCII fails the grammar anyway.
        if !digits.is_ascii() {
            return digits;
        }
        match digits.len() {
            3 => format!("{}.{}", &digits[..1], &digits[1..]),
            4 => format!("{}.{}", &digits[..2], &digits[2..]),
            _ => digits,
        }
    }
}

pub struct OcrTextParser {
    policy: Box<dyn DisplayPolicy>,
}

impl std::fmt::Debug for OcrTextParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrTextParser").finish_non_exhaustive()
    }
}

impl Default for OcrTextParser {
    fn default() -> Self {
        Self::new(Box::new(FixedPointDisplay))
    }
}

impl OcrTextParser {
    pub fn new(policy: Box<dyn DisplayPolicy>) -> Self {
        Self { policy }
    }

    /// Parse one recognized text fragment into a reading.
    pub fn parse(&self, text: &str) -> Result<f64, ParseError> {
        let digits: String = text
            .chars()
            .filter(|c| *c != ',' && *c != '.' && !c.is_whitespace())
            .map(|c| self.policy.correct(c))
            .collect();
        let candidate = self.policy.place_point(digits);
        if !is_decimal(&candidate) {
            return Err(ParseError::NotNumeric(text.to_string()));
        }
        candidate
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::NotNumeric(text.to_string()))
    }
}

/// `-?[0-9]+\.?[0-9]*`, anchored.
fn is_decimal(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    !int.is_empty() && int.bytes().all(|b| b.is_ascii_digit()) && frac.bytes().all(|b| b.is_ascii_digit())
}

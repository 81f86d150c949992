use super::OutputLine;
use crate::error::Result;

/// Data bytes per record
pub const RECORD_BYTES: usize = 32;
pub const END_OF_FILE: &str = ":00000001FF";

/// Two's complement of the low byte of the sum of length, address and data.
pub fn checksum(address: u16, data: &[u8]) -> u8 {
    let [hi, lo] = address.to_be_bytes();
    let sum = data
        .iter()
        .fold((data.len() as u8).wrapping_add(hi).wrapping_add(lo), |sum, b| {
            sum.wrapping_add(*b)
        });
    (!sum).wrapping_add(1)
}

/// Type `00` data record.
pub fn data_record(address: u16, data: &[u8]) -> String {
    let hex: String = data.iter().map(|b| format!("{:02X}", b)).collect();
    format!(
        ":{:02X}{:04X}00{}{:02X}",
        data.len(),
        address,
        hex,
        checksum(address, data)
    )
}

// ----------------------------------------------------------------------------

enum Stage {
    Reading,
    Tail,
    Done,
}

/// Intel hex records of the concatenated line bytes, ending with the EOF
/// record. Errors pass straight through; no partial record is written.
pub struct IntelHex<I> {
    lines: I,
    pending: Vec<u8>,
    address: u16,
    stage: Stage,
}

impl<I> IntelHex<I> {
    pub fn new(lines: I) -> Self {
        IntelHex {
            lines,
            pending: Vec::with_capacity(RECORD_BYTES * 2),
            address: 0,
            stage: Stage::Reading,
        }
    }

    fn record(&mut self, len: usize) -> String {
        let chunk: Vec<u8> = self.pending.drain(..len).collect();
        let record = data_record(self.address, &chunk);
        self.address = self.address.wrapping_add(chunk.len() as u16);
        record
    }
}

impl<I: Iterator<Item = Result<OutputLine>>> Iterator for IntelHex<I> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stage {
                Stage::Reading => {
                    if self.pending.len() >= RECORD_BYTES {
                        return Some(Ok(self.record(RECORD_BYTES)));
                    }
                    match self.lines.next() {
                        Some(Ok(line)) => {
                            self.pending.extend_from_slice(line.bytes().unwrap_or_default())
                        }
                        Some(Err(err)) => {
                            self.stage = Stage::Done;
                            self.pending.clear();
                            return Some(Err(err));
                        }
                        None => self.stage = Stage::Tail,
                    }
                }
                Stage::Tail => {
                    if !self.pending.is_empty() {
                        let len = self.pending.len().min(RECORD_BYTES);
                        return Some(Ok(self.record(len)));
                    }
                    self.stage = Stage::Done;
                    return Some(Ok(END_OF_FILE.to_string()));
                }
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::output::OutputLines;

    fn parse_hex_byte(s: &str) -> u8 {
        u8::from_str_radix(s, 16).unwrap()
    }

    fn verify_checksum(line: &str) {
        assert!(line.starts_with(':'), "record must start with ':'");
        let digits = &line[1..];
        let sum = (0..digits.len())
            .step_by(2)
            .map(|idx| parse_hex_byte(&digits[idx..idx + 2]))
            .fold(0u8, |sum, b| sum.wrapping_add(b));
        assert_eq!(sum, 0, "checksum mismatch for {line}");
    }

    fn hex(lines: Vec<OutputLine>) -> Vec<String> {
        lines
            .into_iter()
            .map(Ok)
            .into_intel_hex()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn three_bytes() {
        let records = hex(vec![OutputLine::new(vec![0x01, 0x02, 0x03], None)]);
        assert_eq!(records, vec![":03000000010203F7", END_OF_FILE]);
        for record in &records {
            verify_checksum(record);
        }
    }

    #[test]
    fn empty_stream_is_only_eof() {
        assert_eq!(hex(vec![]), vec![END_OF_FILE]);
    }

    #[test]
    fn chunks_cross_line_boundaries() {
        let lines: Vec<OutputLine> = (0..5u8)
            .map(|i| OutputLine::new(vec![i; 10], Some(format!("row {i}"))))
            .chain([OutputLine::comment_only("no bytes")])
            .collect();
        let records = hex(lines);
        assert_eq!(records.len(), 3);
        assert!(records[0].starts_with(":20000000"));
        assert!(records[1].starts_with(":12002000"));
        assert_eq!(records[2], END_OF_FILE);
        for record in &records {
            verify_checksum(record);
        }
    }

    #[test]
    fn address_wraps_at_64k() {
        let records = hex(vec![OutputLine::new(vec![0xAA; 0x10000 + 4], None)]);
        let wrapped = &records[records.len() - 2];
        assert!(wrapped.starts_with(":04000000"), "{wrapped}");
    }

    #[test]
    fn checksum_known_value() {
        // :0B0010006164647265737320676170A7 is the classic example record
        let data = b"address gap";
        assert_eq!(
            data_record(0x0010, data),
            ":0B0010006164647265737320676170A7"
        );
    }

    #[test]
    fn error_is_passed_through() {
        let input: Vec<Result<OutputLine>> = vec![
            Ok(OutputLine::new(vec![0x01], None)),
            Err(Error::UnusedReferences(vec!["a".to_string()])),
        ];
        let mut records = input.into_iter().into_intel_hex();
        assert!(matches!(records.next(), Some(Err(Error::UnusedReferences(_)))));
        assert!(records.next().is_none());
    }
}

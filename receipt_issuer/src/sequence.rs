// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

/// Numbers stamped on one receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceNumbers {
    /// Current report (Z-report) number.
    pub report: u32,
    /// Receipt number, used for both the transaction id and the serial.
    pub receipt: u32,
}

/// Hands out report and receipt numbers to a register.
///
/// A receipt number is consumed once it is handed out, even if the receipt
/// then fails to issue. Numbers are never reused.
pub trait SequenceSource {
    fn next(&mut self) -> SequenceNumbers;
}

/// In-memory counters, starting at report 1 and receipt 1 by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSequence {
    report: u32,
    next_receipt: u32,
}

impl CounterSequence {
    pub fn new(report: u32, first_receipt: u32) -> Self {
        CounterSequence {
            report,
            next_receipt: first_receipt,
        }
    }

    pub fn report(&self) -> u32 {
        self.report
    }

    /// Closes the current report and returns the new report number. Receipt
    /// numbering carries on.
    pub fn close_report(&mut self) -> u32 {
        self.report = self.report.wrapping_add(1);
        self.report
    }
}

impl Default for CounterSequence {
    fn default() -> Self {
        CounterSequence::new(1, 1)
    }
}

impl SequenceSource for CounterSequence {
    fn next(&mut self) -> SequenceNumbers {
        let numbers = SequenceNumbers {
            report: self.report,
            receipt: self.next_receipt,
        };
        self.next_receipt = self.next_receipt.wrapping_add(1);
        numbers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_advance_per_receipt() {
        let mut sequence = CounterSequence::default();
        assert_eq!(
            sequence.next(),
            SequenceNumbers {
                report: 1,
                receipt: 1
            }
        );
        assert_eq!(sequence.next().receipt, 2);

        assert_eq!(sequence.close_report(), 2);
        assert_eq!(
            sequence.next(),
            SequenceNumbers {
                report: 2,
                receipt: 3
            }
        );
    }
}

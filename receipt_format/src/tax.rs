// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::{LineItem, UnknownTaxRate};

/// The two VAT rates a line item can carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaxRate {
    #[strum(to_string = "10%")]
    Reduced,
    #[strum(to_string = "20%")]
    Standard,
}

impl TaxRate {
    pub const fn percent(self) -> u8 {
        match self {
            TaxRate::Reduced => 10,
            TaxRate::Standard => 20,
        }
    }

    pub fn fraction(self) -> f64 {
        f64::from(self.percent()) / 100.0
    }
}

impl TryFrom<u8> for TaxRate {
    type Error = UnknownTaxRate;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        match percent {
            10 => Ok(TaxRate::Reduced),
            20 => Ok(TaxRate::Standard),
            other => Err(UnknownTaxRate(other)),
        }
    }
}

impl From<TaxRate> for u8 {
    fn from(rate: TaxRate) -> Self {
        rate.percent()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxDetail {
    pub taxable_amount: f64,
    pub tax_amount: f64,
}

/// Per-rate VAT totals of a receipt.
///
/// Line totals are tax inclusive, so the taxable base of a line is
/// `total / (1 + rate)`. Bases are summed per rate and the tax is taken on the
/// summed base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub reduced: TaxDetail,
    pub standard: TaxDetail,
    pub total_tax: f64,
}

impl TaxBreakdown {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Self {
        let mut reduced_base = 0.0;
        let mut standard_base = 0.0;
        for item in items {
            let base = item.total_price() / (1.0 + item.tax_rate().fraction());
            match item.tax_rate() {
                TaxRate::Reduced => reduced_base += base,
                TaxRate::Standard => standard_base += base,
            }
        }

        let reduced = TaxDetail {
            taxable_amount: reduced_base,
            tax_amount: reduced_base * TaxRate::Reduced.fraction(),
        };
        let standard = TaxDetail {
            taxable_amount: standard_base,
            tax_amount: standard_base * TaxRate::Standard.fraction(),
        };
        TaxBreakdown {
            reduced,
            standard,
            total_tax: reduced.tax_amount + standard.tax_amount,
        }
    }

    pub fn detail(&self, rate: TaxRate) -> &TaxDetail {
        match rate {
            TaxRate::Reduced => &self.reduced,
            TaxRate::Standard => &self.standard,
        }
    }
}

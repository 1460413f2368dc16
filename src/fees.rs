//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Maker/taker fee view over executed trades. Pure functions of the trade and
// the configured rates; no state beyond the schedule itself.
//--------------------------------------------------------------------------------------------------

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Trade;

/// The configured maker/taker fee rates, as fractions of notional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Rate charged to the resting (maker) side.
    pub maker_fee: Decimal,
    /// Rate charged to the aggressing (taker) side.
    pub taker_fee: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            maker_fee: dec!(0.001),
            taker_fee: dec!(0.002),
        }
    }
}

/// The fee split for one trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Fee charged to the maker order.
    pub maker_fee: Decimal,
    /// Fee charged to the taker order.
    pub taker_fee: Decimal,
    /// Sum of both legs.
    pub total_fee: Decimal,
    /// Notional minus total fees.
    pub net_amount: Decimal,
}

impl FeeSchedule {
    pub fn new(maker_fee: Decimal, taker_fee: Decimal) -> Self {
        Self {
            maker_fee,
            taker_fee,
        }
    }

    /// Computes the fee split for a trade. The maker leg always pays the
    /// maker rate and the taker leg the taker rate; which order is which is
    /// given by the trade's maker/taker ids, never by an aggressor label.
    pub fn breakdown(&self, trade: &Trade) -> FeeBreakdown {
        let notional = trade.notional();
        let maker_fee = self.maker_fee * notional;
        let taker_fee = self.taker_fee * notional;
        let total_fee = maker_fee + taker_fee;
        FeeBreakdown {
            maker_fee,
            taker_fee,
            total_fee,
            net_amount: notional - total_fee,
        }
    }
}

//! Display currencies.
//!
//! A profile stores a currency *code*; quote amounts are scalars in that
//! currency's smallest unit. This registry carries the presentation data
//! (symbol, decimal places, symbol position) needed to render an amount.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Where the currency symbol goes relative to the number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

/// Static presentation data for one currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
    /// Number of digits after the decimal separator. Also the scale of the
    /// smallest unit: an amount of `2500` is 25.00 USD but 2500 ARS.
    pub decimals: u8,
    pub position: SymbolPosition,
}

/// Supported display currencies. The first entry is the fallback.
pub const CURRENCIES: &[Currency] = &[
    Currency { code: "ARS", symbol: "$", name: "Peso Argentino", decimals: 0, position: SymbolPosition::Before },
    Currency { code: "USD", symbol: "$", name: "US Dollar", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "BRL", symbol: "R$", name: "Real Brasileño", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "CLP", symbol: "$", name: "Peso Chileno", decimals: 0, position: SymbolPosition::Before },
    Currency { code: "COP", symbol: "$", name: "Peso Colombiano", decimals: 0, position: SymbolPosition::Before },
    Currency { code: "MXN", symbol: "$", name: "Peso Mexicano", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "PEN", symbol: "S/", name: "Sol Peruano", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "UYU", symbol: "$U", name: "Peso Uruguayo", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "PYG", symbol: "₲", name: "Guaraní Paraguayo", decimals: 0, position: SymbolPosition::Before },
    Currency { code: "BOB", symbol: "Bs", name: "Boliviano", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "VES", symbol: "Bs.D", name: "Bolívar Venezolano", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "CAD", symbol: "CA$", name: "Canadian Dollar", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "CRC", symbol: "₡", name: "Colón Costarricense", decimals: 0, position: SymbolPosition::Before },
    Currency { code: "DOP", symbol: "RD$", name: "Peso Dominicano", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "GTQ", symbol: "Q", name: "Quetzal Guatemalteco", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "HNL", symbol: "L", name: "Lempira Hondureña", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "NIO", symbol: "C$", name: "Córdoba Nicaragüense", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "PAB", symbol: "B/.", name: "Balboa Panameño", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "EUR", symbol: "€", name: "Euro", decimals: 2, position: SymbolPosition::After },
    Currency { code: "GBP", symbol: "£", name: "British Pound", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "CHF", symbol: "CHF", name: "Franco Suizo", decimals: 2, position: SymbolPosition::Before },
    Currency { code: "PLN", symbol: "zł", name: "Zloty Polaco", decimals: 2, position: SymbolPosition::After },
    Currency { code: "JPY", symbol: "¥", name: "Yen Japonés", decimals: 0, position: SymbolPosition::Before },
    Currency { code: "KWD", symbol: "د.ك", name: "Dinar Kuwaití", decimals: 3, position: SymbolPosition::Before },
];

impl Currency {
    /// Look up a currency by code (case-insensitive). Unknown codes fall back
    /// to the first registry entry.
    pub fn get(code: &str) -> &'static Currency {
        Currency::find(code).unwrap_or(&CURRENCIES[0])
    }

    pub fn find(code: &str) -> Option<&'static Currency> {
        CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// Render an amount of this currency for display.
    ///
    /// The decimal separator is always `.`; negative amounts carry a leading
    /// minus before the symbol.
    pub fn format(&self, amount: Money) -> String {
        let minor = amount.minor_units();
        let sign = if minor < 0 { "-" } else { "" };
        let magnitude = minor.unsigned_abs();

        let number = if self.decimals == 0 {
            magnitude.to_string()
        } else {
            let scale = 10u64.pow(u32::from(self.decimals));
            format!(
                "{}.{:0width$}",
                magnitude / scale,
                magnitude % scale,
                width = self.decimals as usize
            )
        };

        match self.position {
            SymbolPosition::Before => format!("{sign}{} {number}", self.symbol),
            SymbolPosition::After => format!("{sign}{number} {}", self.symbol),
        }
    }
}

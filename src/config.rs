use dotenv::dotenv;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use tracing::info;

const SYMBOLS: &str = "SYMBOLS";
const MAKER_FEE: &str = "MAKER_FEE";
const TAKER_FEE: &str = "TAKER_FEE";
const SNAPSHOT_DEPTH: &str = "SNAPSHOT_DEPTH";
const APP_ID: &str = "APP_ID";

/// Engine configuration loaded from the environment, with defaults suitable
/// for local runs.
#[derive(Debug, Clone)]
pub struct Config {
    pub symbols: Vec<String>,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    pub snapshot_depth: usize,
    pub app_id: String,
}

impl Config {
    pub fn from_env() -> Config {
        match Self::try_from_env() {
            Ok(config) => config,
            Err(err) => panic!("{}", err),
        }
    }

    pub fn try_from_env() -> Result<Config, String> {
        // Load .env file
        dotenv().ok();

        let symbols_raw = env::var(SYMBOLS).unwrap_or_else(|_| "BTC-USDT,ETH-USDT".to_string());
        let symbols: Vec<String> = symbols_raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(format!("no symbols configured in {}", SYMBOLS));
        }
        info!("configured symbols: {}", symbols.join(", "));

        let maker_fee = parse_decimal(MAKER_FEE, dec!(0.001))?;
        let taker_fee = parse_decimal(TAKER_FEE, dec!(0.002))?;

        let snapshot_depth = match env::var(SNAPSHOT_DEPTH) {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("failed to parse {} as an integer: {}", SNAPSHOT_DEPTH, raw))?,
            Err(_) => 10,
        };

        let app_id = env::var(APP_ID).unwrap_or_else(|_| "matching-engine".to_string());

        Ok(Config {
            symbols,
            maker_fee,
            taker_fee,
            snapshot_depth,
            app_id,
        })
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            symbols: vec!["BTC-USDT".to_string(), "ETH-USDT".to_string()],
            maker_fee: dec!(0.001),
            taker_fee: dec!(0.002),
            snapshot_depth: 10,
            app_id: "matching-engine".to_string(),
        }
    }
}

fn parse_decimal(key: &str, fallback: Decimal) -> Result<Decimal, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<Decimal>()
            .map_err(|_| format!("failed to parse {} as a decimal: {}", key, raw)),
        Err(_) => Ok(fallback),
    }
}

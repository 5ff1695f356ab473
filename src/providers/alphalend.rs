//! AlphaLend market client backed by a Sui fullnode
//!
//! Markets live in a table owned by the lending protocol object, keyed by
//! their `u64` market id. Listing pages through the table's dynamic fields and
//! batch-loads the market objects; a single market is read directly by key.
//!
//! Move content comes back as loosely typed JSON: scalars may be plain values
//! or wrapped structs (`{"type": …, "fields": {"value": …}}`), and the table
//! entry may be the `Field<u64, Market>` wrapper or the market itself. The
//! decoding below accepts all of these shapes.

use crate::{
    aggregate::parse_raw_units,
    client::{LendingMarketClient, PriceSource},
    config::{MarketsLocation, PriceSourceKind, ReportConfig},
    constants::{BPS_DECIMALS, DYNAMIC_FIELDS_PAGE_SIZE, FIXED_POINT_DECIMALS, MULTI_GET_OBJECTS_CHUNK},
    error::ClientError,
    providers::CoinGeckoPriceSource,
    rpc::SuiRpcClient,
    types::{Amount, MarketData, PriceQuote},
};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Percent values (ltv, liquidation threshold) are stored as whole percents
const PERCENT_DECIMALS: u32 = 2;

/// AlphaLend client reading market objects over JSON-RPC
pub struct AlphalendClient {
    rpc: SuiRpcClient,
    markets: MarketsLocation,
    table_id: OnceCell<String>,
    prices: Option<Arc<dyn PriceSource>>,
}

impl AlphalendClient {
    /// Creates a client without a price source
    pub fn new(rpc: SuiRpcClient, markets: MarketsLocation) -> Self {
        Self {
            rpc,
            markets,
            table_id: OnceCell::new(),
            prices: None,
        }
    }

    /// Builds the client described by `config`
    pub fn from_config(config: &ReportConfig) -> Result<Self, ClientError> {
        let rpc = SuiRpcClient::new(config.rpc_url.clone(), config.request_timeout)?;
        let client = Self::new(rpc, config.markets.clone());

        Ok(match config.price_source {
            PriceSourceKind::CoinGecko => {
                client.with_price_source(Arc::new(CoinGeckoPriceSource::new()?))
            }
            PriceSourceKind::Disabled => client,
        })
    }

    /// Fills market prices from `prices`
    pub fn with_price_source(mut self, prices: Arc<dyn PriceSource>) -> Self {
        self.prices = Some(prices);
        self
    }

    /// Object id of the markets table, resolved once per client
    async fn markets_table_id(&self) -> Result<&str, ClientError> {
        let id = self
            .table_id
            .get_or_try_init(|| async {
                match &self.markets {
                    MarketsLocation::Table(id) => Ok::<_, ClientError>(id.clone()),
                    MarketsLocation::Protocol(protocol_id) => {
                        let content = self
                            .rpc
                            .get_object(protocol_id)
                            .await?
                            .into_content("lending protocol")?;
                        let table_id = markets_table_from_protocol(&content)?;
                        tracing::info!(protocol_id = %protocol_id, table_id = %table_id, "Resolved markets table");
                        Ok(table_id)
                    }
                }
            })
            .await?;
        Ok(id.as_str())
    }

    /// Fills `price` on each market the price source can quote
    async fn attach_prices(&self, markets: &mut [MarketData]) {
        let Some(source) = &self.prices else {
            return;
        };

        let coin_types: Vec<&str> = markets.iter().map(|m| m.coin_type.as_str()).collect();
        let quotes = match source.fetch_usd_prices(&coin_types).await {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!(source = source.source_name(), error = %e, "Failed to fetch prices");
                return;
            }
        };

        for market in markets.iter_mut() {
            if let Some(quote) = quotes.get(&market.coin_type) {
                apply_quote(market, quote);
            }
        }
    }

    /// Fills `price` on a single market
    async fn attach_price(&self, market: &mut MarketData) {
        let Some(source) = &self.prices else {
            return;
        };

        match source.fetch_usd_price(&market.coin_type).await {
            Ok(Some(quote)) => apply_quote(market, &quote),
            Ok(None) => {
                tracing::debug!(source = source.source_name(), coin_type = %market.coin_type, "No price listed")
            }
            Err(e) => {
                tracing::warn!(source = source.source_name(), error = %e, "Failed to fetch price")
            }
        }
    }
}

fn apply_quote(market: &mut MarketData, quote: &PriceQuote) {
    tracing::debug!(
        market_id = market.market_id,
        price_usd = quote.price_usd,
        source = %quote.source,
        last_updated = %quote.last_updated,
        "Attached price"
    );
    market.price = Some(Amount::from_f64(quote.price_usd));
}

#[async_trait]
impl LendingMarketClient for AlphalendClient {
    async fn get_all_markets(&self) -> Result<Vec<MarketData>, ClientError> {
        let table_id = self.markets_table_id().await?.to_string();

        let mut object_ids = Vec::new();
        let mut cursor: Option<Value> = None;
        loop {
            let page = self
                .rpc
                .get_dynamic_fields(&table_id, cursor.as_ref(), DYNAMIC_FIELDS_PAGE_SIZE)
                .await?;
            object_ids.extend(page.data.into_iter().map(|field| field.object_id));

            match page.next_cursor {
                Some(next) if page.has_next_page && !next.is_null() => cursor = Some(next),
                _ => break,
            }
        }
        tracing::debug!(count = object_ids.len(), "Listed market entries");

        let mut markets = Vec::with_capacity(object_ids.len());
        for chunk in object_ids.chunks(MULTI_GET_OBJECTS_CHUNK) {
            for response in self.rpc.multi_get_objects(chunk).await? {
                let content = response.into_content("market entry")?;
                markets.push(decode_market(&content)?);
            }
        }
        markets.sort_by_key(|m| m.market_id);

        self.attach_prices(&mut markets).await;
        tracing::info!(count = markets.len(), "Fetched AlphaLend markets");
        Ok(markets)
    }

    async fn get_market_data_from_id(&self, market_id: u64) -> Result<MarketData, ClientError> {
        let table_id = self.markets_table_id().await?.to_string();

        let response = self
            .rpc
            .get_dynamic_field_object(&table_id, json!({ "type": "u64", "value": market_id.to_string() }))
            .await?;
        let content = match response.into_content("market") {
            Ok(content) => content,
            Err(ClientError::ObjectNotFound(_)) => return Err(ClientError::MarketNotFound(market_id)),
            Err(e) => return Err(e),
        };

        let mut market = decode_market(&content)?;
        self.attach_price(&mut market).await;
        Ok(market)
    }

    fn client_name(&self) -> &'static str {
        "alphalend"
    }
}

/// Reads the markets table id from the protocol object's content
fn markets_table_from_protocol(content: &Value) -> Result<String, ClientError> {
    let fields = struct_fields(content)
        .ok_or_else(|| ClientError::invalid_response("lending protocol has no fields"))?;
    let markets = fields
        .get("markets")
        .ok_or_else(|| ClientError::invalid_response("lending protocol has no markets field"))?;

    // Table { id: UID { id: ID }, size }
    struct_fields(markets)
        .and_then(|table| table.get("id"))
        .and_then(scalar)
        .ok_or_else(|| ClientError::invalid_response("markets field is not a table"))
}

/// Decodes one market object into a `MarketData`
pub fn decode_market(content: &Value) -> Result<MarketData, ClientError> {
    let fields = market_fields(content)
        .ok_or_else(|| ClientError::invalid_response("market object has no fields"))?;

    let market_id = field_scalar(fields, "market_id")
        .and_then(|v| v.parse::<u64>().ok())
        .ok_or_else(|| ClientError::invalid_response("market without a market_id"))?;
    let coin_type = field_scalar(fields, "coin_type")
        .map(|c| normalize_coin_type(&c))
        .ok_or_else(|| ClientError::invalid_response(format!("market {} without a coin_type", market_id)))?;

    let mut market = MarketData::new(market_id, coin_type);
    market.decimal_digit = field_scalar(fields, "decimal_digit").and_then(|v| v.parse().ok());

    let available = field_scalar(fields, "balance_holding").and_then(|v| parse_raw_units(&v));
    let borrowed = field_scalar(fields, "borrowed_amount").and_then(|v| parse_raw_units(&v));
    if let (Some(available), Some(borrowed)) = (&available, &borrowed) {
        let supply = Amount::from(available + borrowed);
        market.utilization_rate = utilization(&Amount::from(borrowed.clone()), &supply);
        market.total_supply = Some(supply);
    }
    market.available_liquidity = available.map(Amount::from);
    market.total_borrow = borrowed.map(Amount::from);

    market.xtoken_ratio = field_scalar(fields, "xtoken_ratio")
        .and_then(|v| Amount::from_fixed_point(&v, FIXED_POINT_DECIMALS));

    if let Some(config) = fields.get("config").and_then(struct_fields) {
        market.ltv = field_scalar(config, "ltv")
            .and_then(|v| Amount::from_fixed_point(&v, PERCENT_DECIMALS));
        market.liquidation_threshold = field_scalar(config, "liquidation_threshold")
            .and_then(|v| Amount::from_fixed_point(&v, PERCENT_DECIMALS));
        market.borrow_fee = field_scalar(config, "borrow_fee_bps")
            .and_then(|v| Amount::from_fixed_point(&v, BPS_DECIMALS));
        market.borrow_weight = field_scalar(config, "borrow_weight")
            .and_then(|v| Amount::from_fixed_point(&v, FIXED_POINT_DECIMALS));
        market.allowed_deposit_amount = field_scalar(config, "deposit_limit").map(Amount::new);
        market.allowed_borrow_amount = field_scalar(config, "borrow_limit").map(Amount::new);
    }

    Ok(market)
}

/// Borrowed share of supply; `None` when either value does not fit a `Decimal`
fn utilization(borrowed: &Amount, supply: &Amount) -> Option<Amount> {
    let borrowed = borrowed.to_decimal()?;
    let supply = supply.to_decimal()?;
    if supply.is_zero() {
        return Some(Amount::new("0"));
    }
    borrowed.checked_div(supply).map(Amount::from)
}

/// Coin types from `TypeName` lack the `0x` prefix
fn normalize_coin_type(coin_type: &str) -> String {
    if coin_type.starts_with("0x") {
        coin_type.to_string()
    } else {
        format!("0x{}", coin_type)
    }
}

/// The market struct's fields, unwrapping a `Field<u64, Market>` entry
fn market_fields(content: &Value) -> Option<&Map<String, Value>> {
    let fields = struct_fields(content)?;
    if fields.contains_key("market_id") {
        return Some(fields);
    }
    fields.get("value").and_then(struct_fields)
}

fn struct_fields(value: &Value) -> Option<&Map<String, Value>> {
    value.get("fields").and_then(Value::as_object)
}

fn field_scalar(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields.get(name).and_then(scalar)
}

/// Reduces a Move value to its scalar text
///
/// Wrapper structs (`Number`, `Balance`, `TypeName`, `UID`) are unwrapped
/// through their single meaningful field.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            if let Some(fields) = map.get("fields") {
                return scalar(fields);
            }
            ["value", "name", "id"]
                .iter()
                .find_map(|key| map.get(*key))
                .and_then(scalar)
        }
        _ => None,
    }
}

//! Resource registry and currency pair reads.

use std::collections::BTreeSet;

use diesel::prelude::*;
use market_feeds::models::{currency_pair::CurrencyPair, resource::ResourceDescriptor};

use crate::{models::ResourceRow, schema::{currency_pairs, resource_registry}};

/// Active resources in id order.
pub fn active_resources(conn: &mut SqliteConnection) -> QueryResult<Vec<ResourceDescriptor>> {
    let rows = resource_registry::table
        .filter(resource_registry::is_active.eq(1))
        .order(resource_registry::id.asc())
        .select(ResourceRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(ResourceDescriptor::from).collect())
}

/// Distinct pairs with both sides present, sorted by base then quote.
pub fn currency_pairs(conn: &mut SqliteConnection) -> QueryResult<Vec<CurrencyPair>> {
    let rows: Vec<(Option<String>, Option<String>)> = currency_pairs::table
        .select((currency_pairs::base_currency, currency_pairs::quote_currency))
        .filter(currency_pairs::base_currency.is_not_null())
        .filter(currency_pairs::quote_currency.is_not_null())
        .distinct()
        .order((currency_pairs::base_currency.asc(), currency_pairs::quote_currency.asc()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .filter_map(|(base, quote)| {
            let base = base?.trim().to_uppercase();
            let quote = quote?.trim().to_uppercase();
            (!base.is_empty() && !quote.is_empty()).then(|| CurrencyPair::new(base, quote))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect())
}

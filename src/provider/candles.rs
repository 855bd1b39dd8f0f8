//! OHLC synthesis from raw price samples.
//!
//! Used when the provider's native candle endpoint returns nothing: the
//! chart series gives `(timestamp, price)` samples, which are aggregated
//! into one candle per fixed-width time bucket.

use std::collections::BTreeMap;

use crate::provider::types::Candle;

const INTRADAY_BUCKET_MS: i64 = 15 * 60 * 1000;
const HOURLY_BUCKET_MS: i64 = 60 * 60 * 1000;

/// Bucket width for a day-span: 15 minutes intraday, hourly beyond that.
pub fn bucket_width_ms(days: u32) -> i64 {
    if days <= 1 {
        INTRADAY_BUCKET_MS
    } else {
        HOURLY_BUCKET_MS
    }
}

/// Aggregate `[epoch_ms, price]` samples into one candle per bucket.
///
/// Samples are consumed in input order: the first sample landing in a
/// bucket sets `open`, the last sets `close`, and `high`/`low` track the
/// running extremes. Output ascends by bucket start with no duplicate
/// timestamps.
pub fn synthesize(samples: &[[f64; 2]], width_ms: i64) -> Vec<Candle> {
    let mut buckets: BTreeMap<i64, Candle> = BTreeMap::new();

    for [ts, price] in samples {
        let time = (*ts as i64).div_euclid(width_ms) * width_ms;

        buckets
            .entry(time)
            .and_modify(|c| {
                c.high = c.high.max(*price);
                c.low = c.low.min(*price);
                c.close = *price;
            })
            .or_insert(Candle {
                time,
                open: *price,
                high: *price,
                low: *price,
                close: *price,
            });
    }

    buckets.into_values().collect()
}

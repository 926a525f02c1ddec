use crate::schema::{GroupKey, SalesRecord, Value};
use crate::utils::{margin_percent, round_to, round_whole};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summed quantity, turnover and margin for one grouping key, rounded to whole units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub quantity: i64,
    pub turnover: i64,
    pub margin: i64,
    pub margin_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Totals {
    pub quantity: i64,
    pub turnover: i64,
    pub margin: i64,
    pub margin_percent: f64,
}

/// One transaction line of a dealer's detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub nomenclature: Value,
    pub brand: Value,
    pub total_power_mw: Value,
    pub container: f64,
    pub quantity: Value,
    pub turnover: Value,
    pub margin: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DealerDetail {
    pub dealer: GroupKey,
    pub lines: Vec<DetailLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesSummary {
    pub by_group: Vec<AggregateRow>,
    pub by_dealer: Vec<AggregateRow>,
    pub totals: Totals,
    pub dealer_details: Vec<DealerDetail>,
}

#[derive(Debug, Default, Clone, Copy)]
struct RawSums {
    quantity: f64,
    turnover: f64,
    margin: f64,
}

impl RawSums {
    fn add(&mut self, record: &SalesRecord) {
        // Nulls and non-numeric cells are skipped.
        self.quantity += record.quantity_register_uom.as_f64().unwrap_or(0.0);
        self.turnover += record.total_final_price_czk.as_f64().unwrap_or(0.0);
        self.margin += record.gross_margin_czk.as_f64().unwrap_or(0.0);
    }

    fn rounded(&self) -> (i64, i64, i64) {
        (
            round_whole(self.quantity),
            round_whole(self.turnover),
            round_whole(self.margin),
        )
    }
}

pub struct Aggregator;

impl Aggregator {
    pub fn summarize(records: &[SalesRecord]) -> SalesSummary {
        let by_dealer = Self::group_by(records, |r| &r.dealer_name);
        SalesSummary {
            by_group: Self::group_by(records, |r| &r.nomen_group_parent),
            totals: Self::totals(&by_dealer),
            by_dealer,
            dealer_details: Self::dealer_details(records),
        }
    }

    /// One row per distinct key, ordered by key with the missing-key bucket last.
    /// Sums are rounded first and the margin ratio derived from the rounded sums.
    pub fn group_by<F>(records: &[SalesRecord], key_of: F) -> Vec<AggregateRow>
    where
        F: Fn(&SalesRecord) -> &Value,
    {
        let mut groups: BTreeMap<GroupKey, RawSums> = BTreeMap::new();
        for record in records {
            groups
                .entry(GroupKey::from_value(key_of(record)))
                .or_default()
                .add(record);
        }

        groups
            .into_iter()
            .map(|(key, sums)| {
                let (quantity, turnover, margin) = sums.rounded();
                AggregateRow {
                    key,
                    quantity,
                    turnover,
                    margin,
                    margin_percent: margin_percent(margin, turnover),
                }
            })
            .collect()
    }

    /// Table-wide totals as the sum of already rounded rows, so the dealer
    /// rows always add up to the totals shown beside them.
    pub fn totals(rows: &[AggregateRow]) -> Totals {
        let quantity = rows.iter().map(|r| r.quantity).sum();
        let turnover = rows.iter().map(|r| r.turnover).sum();
        let margin = rows.iter().map(|r| r.margin).sum();
        Totals {
            quantity,
            turnover,
            margin,
            margin_percent: margin_percent(margin, turnover),
        }
    }

    /// Transaction lines per dealer, dealers in aggregate order, lines in input order.
    pub fn dealer_details(records: &[SalesRecord]) -> Vec<DealerDetail> {
        let mut dealers: BTreeMap<GroupKey, Vec<DetailLine>> = BTreeMap::new();
        for record in records {
            dealers
                .entry(GroupKey::from_value(&record.dealer_name))
                .or_default()
                .push(DetailLine {
                    nomenclature: record.nomenclature.clone(),
                    brand: record.brand.clone(),
                    total_power_mw: record.total_power_mw.clone(),
                    container: container_count(record),
                    quantity: record.quantity_register_uom.clone(),
                    turnover: record.total_final_price_czk.clone(),
                    margin: record.gross_margin_czk.clone(),
                });
        }

        dealers
            .into_iter()
            .map(|(dealer, lines)| DealerDetail { dealer, lines })
            .collect()
    }
}

/// `quantity / pcs_container` rounded to 2 places; `0` when either is absent or the divisor is zero.
pub fn container_count(record: &SalesRecord) -> f64 {
    match (
        record.quantity_register_uom.as_f64(),
        record.pcs_container.as_f64(),
    ) {
        (Some(quantity), Some(per_container)) if per_container != 0.0 => {
            round_to(quantity / per_container, 2)
        }
        _ => 0.0,
    }
}

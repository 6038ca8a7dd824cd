use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, NumericInput, Quantity, Sku, StocktakeId, WarehouseId};

/// One counted line as submitted by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StocktakeLineInput {
    pub sku: String,
    pub counted_qty: NumericInput,
}

/// Validated count for one sku.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountedLine {
    pub sku: Sku,
    pub counted: Quantity,
}

/// Normalize a stocktake submission. Empty or duplicated skus are rejected.
pub fn validate_counts(lines: &[StocktakeLineInput]) -> DomainResult<Vec<CountedLine>> {
    if lines.is_empty() {
        return Err(DomainError::validation("stocktake must contain at least one entry"));
    }
    let mut out: Vec<CountedLine> = Vec::with_capacity(lines.len());
    for line in lines {
        let sku = Sku::parse(&line.sku)?;
        if out.iter().any(|l| l.sku == sku) {
            return Err(DomainError::validation(format!(
                "sku {sku} appears more than once in stocktake"
            )));
        }
        let counted = Quantity::non_negative(&line.counted_qty, "counted_qty")?;
        out.push(CountedLine { sku, counted });
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StocktakeEntry {
    pub sku: Sku,
    pub counted_qty: i64,
    /// New available minus previous available.
    pub delta: i64,
    pub applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stocktake {
    pub id: StocktakeId,
    pub warehouse_id: WarehouseId,
    pub entries: Vec<StocktakeEntry>,
    pub submitted_by: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(sku: &str, qty: NumericInput) -> StocktakeLineInput {
        StocktakeLineInput {
            sku: sku.into(),
            counted_qty: qty,
        }
    }

    #[test]
    fn counts_accept_text_and_zero() {
        let lines = validate_counts(&[line("A", "7".into()), line("B", 0.into())]).unwrap();
        assert_eq!(lines[0].counted.get(), 7);
        assert_eq!(lines[1].counted.get(), 0);
    }

    #[test]
    fn duplicate_sku_is_rejected() {
        let err = validate_counts(&[line("A", 1.into()), line(" A", 2.into())]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn negative_count_is_rejected() {
        assert!(validate_counts(&[line("A", (-1).into())]).is_err());
        assert!(validate_counts(&[]).is_err());
    }
}

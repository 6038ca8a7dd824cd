use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, Money, NumericInput, Quantity, Sku};

/// Inbound line as a client sends it. Numbers may arrive as JSON numbers or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundLineInput {
    pub sku: String,
    pub quantity: NumericInput,
    pub unit_price: NumericInput,
}

/// Normalized inbound line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundLine {
    pub sku: Sku,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl InboundLine {
    pub fn amount(&self) -> DomainResult<Money> {
        self.unit_price.checked_mul_qty(self.quantity)
    }
}

/// Validate and normalize order lines.
///
/// Lines must be non-empty, quantities > 0, prices >= 0 with at most two
/// decimals, and each sku may appear once.
pub fn validate_lines(inputs: &[InboundLineInput]) -> DomainResult<Vec<InboundLine>> {
    if inputs.is_empty() {
        return Err(DomainError::validation("items cannot be empty"));
    }
    let mut lines: Vec<InboundLine> = Vec::with_capacity(inputs.len());
    for (idx, input) in inputs.iter().enumerate() {
        let sku = Sku::parse(&input.sku)?;
        if lines.iter().any(|l| l.sku == sku) {
            return Err(DomainError::validation(format!("duplicate sku {sku} in items")));
        }
        let quantity = Quantity::positive(&input.quantity, &format!("items[{idx}].quantity"))?;
        let unit_price = Money::parse(&input.unit_price, &format!("items[{idx}].unit_price"))?;
        lines.push(InboundLine {
            sku,
            quantity,
            unit_price,
        });
    }
    Ok(lines)
}

/// (total quantity, total amount) over a set of lines.
pub(crate) fn totals(lines: &[InboundLine]) -> DomainResult<(i64, Money)> {
    lines.iter().try_fold((0i64, Money::ZERO), |(qty, amount), line| {
        let qty = qty
            .checked_add(line.quantity.get())
            .ok_or_else(|| DomainError::validation("total quantity overflow"))?;
        Ok((qty, amount.checked_add(line.amount()?)?))
    })
}

use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, NumericInput, Quantity, Sku};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundLineInput {
    pub sku: String,
    pub quantity: NumericInput,
}

/// Outbound line. `scanned` flips once the picker confirms the sku.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundLine {
    pub sku: Sku,
    pub quantity: Quantity,
    pub scanned: bool,
}

pub fn validate_lines(inputs: &[OutboundLineInput]) -> DomainResult<Vec<OutboundLine>> {
    if inputs.is_empty() {
        return Err(DomainError::validation("items cannot be empty"));
    }
    let mut lines: Vec<OutboundLine> = Vec::with_capacity(inputs.len());
    for (idx, input) in inputs.iter().enumerate() {
        let sku = Sku::parse(&input.sku)?;
        if lines.iter().any(|l| l.sku == sku) {
            return Err(DomainError::validation(format!("duplicate sku {sku} in items")));
        }
        let quantity = Quantity::positive(&input.quantity, &format!("items[{idx}].quantity"))?;
        lines.push(OutboundLine {
            sku,
            quantity,
            scanned: false,
        });
    }
    total_quantity(&lines)?;
    Ok(lines)
}

/// Sum of line quantities; overflow is a validation error.
pub fn total_quantity(lines: &[OutboundLine]) -> DomainResult<i64> {
    lines.iter().try_fold(0i64, |acc, line| {
        acc.checked_add(line.quantity.get())
            .ok_or_else(|| DomainError::validation("total quantity overflow"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_start_unscanned() {
        let lines = validate_lines(&[OutboundLineInput {
            sku: "SKU-1".into(),
            quantity: "4".into(),
        }])
        .unwrap();
        assert_eq!(lines[0].quantity.get(), 4);
        assert!(!lines[0].scanned);
    }

    #[test]
    fn rejects_empty_and_non_positive() {
        assert!(validate_lines(&[]).is_err());
        let err = validate_lines(&[OutboundLineInput {
            sku: "SKU-1".into(),
            quantity: (-2).into(),
        }])
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn rejects_total_that_overflows() {
        let max = i64::MAX.to_string();
        let err = validate_lines(&[
            OutboundLineInput {
                sku: "SKU-1".into(),
                quantity: max.as_str().into(),
            },
            OutboundLineInput {
                sku: "SKU-2".into(),
                quantity: max.as_str().into(),
            },
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn line_wire_shape() {
        let lines = validate_lines(&[OutboundLineInput {
            sku: "SKU-1".into(),
            quantity: 2.into(),
        }])
        .unwrap();
        assert_eq!(
            serde_json::to_value(&lines[0]).unwrap(),
            serde_json::json!({ "sku": "SKU-1", "quantity": 2, "scanned": false })
        );
        let raw = r#"[{"sku":"SKU-1","quantity":"3"},{"sku":"SKU-2","quantity":4}]"#;
        let inputs: Vec<OutboundLineInput> = serde_json::from_str(raw).unwrap();
        assert_eq!(total_quantity(&validate_lines(&inputs).unwrap()).unwrap(), 7);
    }
}

//! # Sale Ledger
//!
//! The only place where order totals, balance due and payment status are
//! computed. Repositories persist what these functions return; they never
//! redo the arithmetic themselves.
//!
//! ## Invariants
//! ```text
//! subtotal(line)  = quantity × unit_price
//! total           = Σ subtotal(line)
//! balance_due     = total − amount_paid          (negative = customer credit)
//! settled         ⇔ balance_due ≤ PAID_TOLERANCE
//! status          only ever moves up: PENDIENTE < ABONADO < PAGADO < ENTREGADO
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::SaleStatus;
use crate::validation::{validate_payment_amount, validate_price};
use crate::{MAX_AMOUNT_CENTS, MAX_ITEM_QUANTITY, MAX_SALE_LINES};

/// A balance at or below this is considered paid in full.
pub const PAID_TOLERANCE: Money = Money::from_cents(1);

/// Quantity and price of one line, as the ledger sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleLine {
    pub const fn new(quantity: i64, unit_price: Money) -> Self {
        SaleLine {
            quantity,
            unit_price,
        }
    }

    #[inline]
    pub const fn subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

/// Sum of line subtotals, refusing to wrap around.
pub fn sale_total(lines: &[SaleLine]) -> CoreResult<Money> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        line.unit_price
            .checked_mul_quantity(line.quantity)
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| amount_overflow("sale total"))
    })
}

/// `total − paid`. The one definition of balance due.
#[inline]
pub fn balance_due(total: Money, paid: Money) -> Money {
    total - paid
}

/// Whether the remaining balance is within the paid tolerance.
#[inline]
pub fn is_settled(balance: Money) -> bool {
    balance <= PAID_TOLERANCE
}

/// Status implied by the amounts alone.
fn status_for(total: Money, paid: Money) -> SaleStatus {
    if is_settled(balance_due(total, paid)) {
        SaleStatus::Pagado
    } else if paid.is_positive() {
        SaleStatus::Abonado
    } else {
        SaleStatus::Pendiente
    }
}

/// Status of a freshly registered sale.
///
/// ```rust
/// use siconi_core::ledger::initial_status;
/// use siconi_core::{Money, SaleStatus};
///
/// let total = Money::from_cents(6000);
/// assert_eq!(initial_status(total, Money::zero()), SaleStatus::Pendiente);
/// assert_eq!(initial_status(total, Money::from_cents(3000)), SaleStatus::Abonado);
/// assert_eq!(initial_status(total, total), SaleStatus::Pagado);
/// ```
pub fn initial_status(total: Money, paid: Money) -> SaleStatus {
    status_for(total, paid)
}

/// Status after the sale's amounts changed. Never moves backwards, so an
/// ENTREGADO order stays ENTREGADO even if it still owes money.
pub fn status_after_payment(current: SaleStatus, total: Money, paid: Money) -> SaleStatus {
    let implied = status_for(total, paid);
    if implied.rank() > current.rank() {
        implied
    } else {
        current
    }
}

/// Amount by which a payment exceeds the balance it is applied to.
///
/// Overpayments are accepted and kept as customer credit; this is what gets
/// reported back to the operator.
pub fn overpayment(balance_before: Money, amount: Money) -> Money {
    (amount - balance_before.max_zero()).max_zero()
}

/// Validates the shape of a sale before any row is written.
pub fn validate_lines(lines: &[SaleLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(CoreError::EmptySale);
    }
    if lines.len() > MAX_SALE_LINES {
        return Err(CoreError::TooManyLines {
            max: MAX_SALE_LINES,
        });
    }
    for line in lines {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if line.quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: line.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_price("unit price", line.unit_price)?;
    }
    Ok(())
}

/// Totals of a sale about to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub total: Money,
    pub amount_paid: Money,
    pub balance_due: Money,
    pub status: SaleStatus,
    pub overpayment: Money,
}

impl SaleTotals {
    /// Computes every header amount for a new sale.
    pub fn compute(lines: &[SaleLine], amount_paid: Money) -> CoreResult<Self> {
        validate_lines(lines)?;
        if amount_paid.is_negative() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "deposit cannot be negative".to_string(),
            });
        }
        if amount_paid.cents() > MAX_AMOUNT_CENTS {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!("deposit cannot exceed {}", Money::from_cents(MAX_AMOUNT_CENTS)),
            });
        }

        let total = sale_total(lines)?;
        Ok(SaleTotals {
            total,
            amount_paid,
            balance_due: balance_due(total, amount_paid),
            status: initial_status(total, amount_paid),
            overpayment: overpayment(total, amount_paid),
        })
    }
}

/// Outcome of applying one payment to a sale's amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub amount_paid: Money,
    pub balance_due: Money,
    pub status: SaleStatus,
    pub overpayment: Money,
}

/// Applies a payment to a sale's current amounts.
///
/// ```rust
/// use siconi_core::ledger::apply_payment;
/// use siconi_core::{Money, SaleStatus};
///
/// let applied = apply_payment(
///     SaleStatus::Abonado,
///     Money::from_cents(6000),
///     Money::from_cents(3000),
///     Money::from_cents(3000),
/// )
/// .unwrap();
///
/// assert_eq!(applied.balance_due, Money::zero());
/// assert_eq!(applied.status, SaleStatus::Pagado);
/// ```
pub fn apply_payment(
    current: SaleStatus,
    total: Money,
    paid_before: Money,
    amount: Money,
) -> CoreResult<PaymentApplication> {
    validate_payment_amount(amount).map_err(|e| CoreError::InvalidPaymentAmount {
        reason: e.to_string(),
    })?;

    let amount_paid = paid_before
        .checked_add(amount)
        .ok_or_else(|| CoreError::InvalidPaymentAmount {
            reason: "amount paid would overflow".to_string(),
        })?;
    let balance_before = balance_due(total, paid_before);
    Ok(PaymentApplication {
        amount_paid,
        balance_due: balance_due(total, amount_paid),
        status: status_after_payment(current, total, amount_paid),
        overpayment: overpayment(balance_before, amount),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn test_workshop_scenario() {
        // 3 swimsuits at $20, $30 deposit
        let totals = SaleTotals::compute(&[SaleLine::new(3, m(2000))], m(3000)).unwrap();
        assert_eq!(totals.total, m(6000));
        assert_eq!(totals.balance_due, m(3000));
        assert_eq!(totals.status, SaleStatus::Abonado);

        let applied = apply_payment(totals.status, totals.total, totals.amount_paid, m(3000)).unwrap();
        assert_eq!(applied.amount_paid, m(6000));
        assert_eq!(applied.balance_due, Money::zero());
        assert_eq!(applied.status, SaleStatus::Pagado);
        assert_eq!(applied.overpayment, Money::zero());
    }

    #[test]
    fn test_one_cent_counts_as_paid() {
        let applied = apply_payment(SaleStatus::Pendiente, m(1000), m(0), m(999)).unwrap();
        assert_eq!(applied.balance_due, m(1));
        assert_eq!(applied.status, SaleStatus::Pagado);

        let applied = apply_payment(SaleStatus::Pendiente, m(1000), m(0), m(998)).unwrap();
        assert_eq!(applied.status, SaleStatus::Abonado);
    }

    #[test]
    fn test_status_never_reverts() {
        assert_eq!(
            status_after_payment(SaleStatus::Entregado, m(5000), m(1000)),
            SaleStatus::Entregado
        );
        assert_eq!(
            status_after_payment(SaleStatus::Pagado, m(5000), m(0)),
            SaleStatus::Pagado
        );
    }

    #[test]
    fn test_overpayment_is_reported_as_credit() {
        let applied = apply_payment(SaleStatus::Abonado, m(6000), m(3000), m(5000)).unwrap();
        assert_eq!(applied.balance_due, m(-2000));
        assert_eq!(applied.overpayment, m(2000));
        assert_eq!(applied.status, SaleStatus::Pagado);

        // Paying on top of existing credit: the whole amount is extra
        assert_eq!(overpayment(m(-500), m(1000)), m(1000));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            SaleTotals::compute(&[], m(0)),
            Err(CoreError::EmptySale)
        ));
        assert!(matches!(
            SaleTotals::compute(&[SaleLine::new(1000, m(100))], m(0)),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(SaleTotals::compute(&[SaleLine::new(0, m(100))], m(0)).is_err());
        assert!(SaleTotals::compute(&[SaleLine::new(1, m(100))], m(-1)).is_err());
        assert!(apply_payment(SaleStatus::Pendiente, m(100), m(0), m(0)).is_err());
    }

    #[test]
    fn test_huge_amounts_are_refused_not_wrapped() {
        let huge: Money = "92233720368547758".parse().unwrap();

        let err = SaleTotals::compute(&[SaleLine::new(2, huge)], m(0)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::OutOfRange { .. })));

        let err = SaleTotals::compute(&[SaleLine::new(1, m(100))], huge).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentAmount { .. }));

        let err = apply_payment(SaleStatus::Pendiente, m(6000), m(0), huge).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentAmount { .. }));

        // A corrupted paid_before must not wrap either
        let err = apply_payment(SaleStatus::Abonado, m(6000), m(i64::MAX - 10), m(100)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentAmount { .. }));
    }

    #[test]
    fn test_sale_total_rejects_overflow() {
        let lines = [SaleLine::new(3, m(2000)), SaleLine::new(1, m(500))];
        assert_eq!(sale_total(&lines).unwrap(), m(6500));
        assert!(sale_total(&[SaleLine::new(2, m(i64::MAX / 2 + 1))]).is_err());
    }

    #[test]
    fn test_largest_allowed_sale_fits() {
        let lines = vec![SaleLine::new(MAX_ITEM_QUANTITY, m(MAX_AMOUNT_CENTS)); MAX_SALE_LINES];
        let totals = SaleTotals::compute(&lines, m(MAX_AMOUNT_CENTS)).unwrap();
        assert_eq!(
            totals.total.cents(),
            MAX_AMOUNT_CENTS * MAX_ITEM_QUANTITY * MAX_SALE_LINES as i64
        );
    }

    #[test]
    fn test_zero_total_sale_is_paid() {
        let totals = SaleTotals::compute(&[SaleLine::new(2, m(0))], m(0)).unwrap();
        assert_eq!(totals.status, SaleStatus::Pagado);
    }
}

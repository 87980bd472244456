//! # Domain Types
//!
//! Core domain types used throughout SICONI.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Payment      │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  code (unique)  │   │  code PED-0001  │   │  sale_id (FK)   │       │
//! │  │  current_stock  │◄─┐│  total / paid   │◄──│  amount_cents   │       │
//! │  │  min_stock      │  ││  balance_due    │   │  method         │       │
//! │  └─────────────────┘  ││  status         │   └─────────────────┘       │
//! │          ▲            │└─────────────────┘                              │
//! │          │            │         ▲                                       │
//! │  ┌───────┴─────────┐  │┌────────┴────────┐   ┌─────────────────┐       │
//! │  │InventoryMovement│  └│   SaleDetail    │   │     Client      │       │
//! │  │  append-only    │   │  qty × price    │   │  is_vip, club   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4, immutable, used for every database relation
//! - Business key where one exists: product `code`, sale `code`, `username`

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Enumerations
// =============================================================================

/// Payment / fulfilment lifecycle of a sale.
///
/// ```text
/// PENDIENTE ──pay──► ABONADO ──pay (balance ≤ 1¢)──► PAGADO ──► ENTREGADO
///     └──────────────pay in full───────────────────────┘
/// ```
/// Transitions only move right; nothing reverts a status automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    /// Nothing paid yet.
    Pendiente,
    /// Partially paid.
    Abonado,
    /// Balance settled.
    Pagado,
    /// Handed over to the client.
    Entregado,
}

impl SaleStatus {
    /// Position in the lifecycle; used for upward-only transitions.
    pub const fn rank(self) -> u8 {
        match self {
            SaleStatus::Pendiente => 0,
            SaleStatus::Abonado => 1,
            SaleStatus::Pagado => 2,
            SaleStatus::Entregado => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Pendiente => "PENDIENTE",
            SaleStatus::Abonado => "ABONADO",
            SaleStatus::Pagado => "PAGADO",
            SaleStatus::Entregado => "ENTREGADO",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pendiente
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDIENTE" => Ok(SaleStatus::Pendiente),
            "ABONADO" => Ok(SaleStatus::Abonado),
            "PAGADO" => Ok(SaleStatus::Pagado),
            "ENTREGADO" => Ok(SaleStatus::Entregado),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["PENDIENTE", "ABONADO", "PAGADO", "ENTREGADO"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

/// Direction of an inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    /// Stock coming in.
    Entrada,
    /// Stock going out.
    Salida,
}

impl MovementKind {
    /// ENTRADA for a positive delta, SALIDA otherwise.
    pub const fn from_delta(delta: i64) -> Self {
        if delta > 0 {
            MovementKind::Entrada
        } else {
            MovementKind::Salida
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MovementKind::Entrada => "ENTRADA",
            MovementKind::Salida => "SALIDA",
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    PagoMovil,
    PuntoDeVenta,
    /// Cash in foreign currency.
    Divisas,
    Otro,
}

impl PaymentMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "EFECTIVO",
            PaymentMethod::Transferencia => "TRANSFERENCIA",
            PaymentMethod::PagoMovil => "PAGO_MOVIL",
            PaymentMethod::PuntoDeVenta => "PUNTO_DE_VENTA",
            PaymentMethod::Divisas => "DIVISAS",
            PaymentMethod::Otro => "OTRO",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Efectivo
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Accepts the stored names plus the short forms typed at the counter.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "EFECTIVO" | "CASH" => Ok(PaymentMethod::Efectivo),
            "TRANSFERENCIA" | "TRANSFER" => Ok(PaymentMethod::Transferencia),
            "PAGO_MOVIL" | "PAGOMOVIL" => Ok(PaymentMethod::PagoMovil),
            "PUNTO_DE_VENTA" | "PUNTO" | "POS" | "CARD" => Ok(PaymentMethod::PuntoDeVenta),
            "DIVISAS" | "USD" => Ok(PaymentMethod::Divisas),
            "OTRO" | "OTHER" => Ok(PaymentMethod::Otro),
            _ => Err(ValidationError::NotAllowed {
                field: "method".to_string(),
                allowed: [
                    "EFECTIVO",
                    "TRANSFERENCIA",
                    "PAGO_MOVIL",
                    "PUNTO_DE_VENTA",
                    "DIVISAS",
                    "OTRO",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }),
        }
    }
}

/// Access level of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Vendedor,
    Asistente,
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "VENDEDOR" => Ok(UserRole::Vendedor),
            "ASISTENTE" => Ok(UserRole::Asistente),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec![
                    "ADMIN".to_string(),
                    "VENDEDOR".to_string(),
                    "ASISTENTE".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product in the workshop catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,

    /// Business code printed on labels and receipts.
    pub code: String,

    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,

    /// Cost in cents, used for profit reports.
    pub cost_price_cents: i64,

    /// Default selling price in cents.
    pub sale_price_cents: i64,

    /// Units on hand. Never negative after any committed write.
    pub current_stock: i64,

    /// Low-stock threshold.
    pub min_stock: i64,

    /// Soft delete flag.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// At or below the minimum stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }

    /// Whether `quantity` units can leave the shelf.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// Swim club a client trains with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Club {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: String,
    pub name: String,
    /// RIF or other tax identifier.
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: String,
    pub name: String,
    /// Cédula / RIF.
    pub document_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub club_id: Option<String>,
    pub is_vip: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// One row of the append-only stock audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    /// Always positive; direction is in `kind`.
    pub quantity: i64,
    pub kind: MovementKind,
    /// Stored uppercased.
    pub observation: String,
    /// Set when the movement came from a sale line.
    pub sale_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryMovement {
    /// Quantity with sign restored (+ for ENTRADA, - for SALIDA).
    pub fn signed_quantity(&self) -> i64 {
        match self.kind {
            MovementKind::Entrada => self.quantity,
            MovementKind::Salida => -self.quantity,
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

/// Sale header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Order code, `PED-0001`.
    pub code: String,
    pub client_id: Option<String>,
    pub total_cents: i64,
    pub amount_paid_cents: i64,
    /// Always `total_cents - amount_paid_cents`; negative means customer credit.
    pub balance_due_cents: i64,
    /// Exchange rate at the time of sale, kept for receipts only.
    pub exchange_rate: f64,
    pub status: SaleStatus,
    pub invoice_number: Option<String>,
    pub control_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    #[inline]
    pub fn balance_due(&self) -> Money {
        Money::from_cents(self.balance_due_cents)
    }
}

/// A line item of a sale. Never updated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleDetail {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// `quantity × unit_price_cents`.
    pub subtotal_cents: i64,
}

/// A payment toward a sale. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub paid_at: DateTime<Utc>,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// Bank or transfer reference.
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inputs
// =============================================================================

/// Fields for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub cost_price: Money,
    pub sale_price: Money,
    /// Opening stock.
    pub initial_stock: i64,
    pub min_stock: i64,
}

/// Editable product fields. Stock is deliberately absent: it only moves
/// through sales and stock adjustments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub supplier_id: Option<String>,
    pub cost_price: Money,
    pub sale_price: Money,
    pub min_stock: i64,
}

impl From<&Product> for ProductUpdate {
    fn from(p: &Product) -> Self {
        ProductUpdate {
            name: p.name.clone(),
            description: p.description.clone(),
            category_id: p.category_id.clone(),
            supplier_id: p.supplier_id.clone(),
            cost_price: p.cost_price(),
            sale_price: p.sale_price(),
            min_stock: p.min_stock,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub document_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub club_id: Option<String>,
    pub is_vip: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// One requested line of a new sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineInput {
    pub product_id: String,
    pub quantity: i64,
    /// Overrides the product's sale price when set.
    pub unit_price: Option<Money>,
}

/// Everything needed to register a sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSale {
    pub client_id: Option<String>,
    pub lines: Vec<SaleLineInput>,
    /// Deposit taken at the counter; may be zero.
    pub amount_paid: Money,
    /// Method of the deposit, when there is one.
    pub payment_method: PaymentMethod,
    pub exchange_rate: f64,
    pub notes: Option<String>,
}

/// A payment to register against an existing sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub sale_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Reports
// =============================================================================

/// Inclusive calendar-date range used by every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: format!("{} is after {}", from, to),
            });
        }
        Ok(DateRange { from, to })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        DateRange { from: date, to: date }
    }

    /// First instant of `from`, UTC.
    pub fn start(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// First instant after `to`, UTC.
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.to
            .succ_opt()
            .unwrap_or(NaiveDate::MAX)
            .and_time(NaiveTime::MIN)
            .and_utc()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at < self.end_exclusive()
    }
}

/// Revenue / cost / profit over a date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub units_sold: i64,
    pub revenue_cents: i64,
    pub cost_cents: i64,
    pub profit_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopProduct {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// A sale that still has money owed on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Receivable {
    pub sale_id: String,
    pub code: String,
    pub client_name: Option<String>,
    pub total_cents: i64,
    pub balance_due_cents: i64,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub payment_count: i64,
    pub amount_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_rank_is_monotonic() {
        assert!(SaleStatus::Pendiente.rank() < SaleStatus::Abonado.rank());
        assert!(SaleStatus::Abonado.rank() < SaleStatus::Pagado.rank());
        assert!(SaleStatus::Pagado.rank() < SaleStatus::Entregado.rank());
        assert_eq!(SaleStatus::default(), SaleStatus::Pendiente);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&SaleStatus::Abonado).unwrap();
        assert_eq!(json, "\"ABONADO\"");
        assert_eq!("pagado".parse::<SaleStatus>().unwrap(), SaleStatus::Pagado);
        assert!("cerrado".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_movement_kind_from_delta() {
        assert_eq!(MovementKind::from_delta(5), MovementKind::Entrada);
        assert_eq!(MovementKind::from_delta(-5), MovementKind::Salida);
    }

    #[test]
    fn test_payment_method_aliases() {
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Efectivo);
        assert_eq!("pago movil".parse::<PaymentMethod>().unwrap(), PaymentMethod::PagoMovil);
        assert_eq!("punto-de-venta".parse::<PaymentMethod>().unwrap(), PaymentMethod::PuntoDeVenta);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::PagoMovil).unwrap(),
            "\"PAGO_MOVIL\""
        );
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_date_range_bounds() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let range = DateRange::new(d("2026-03-01"), d("2026-03-31")).unwrap();

        assert!(range.contains(d("2026-03-31").and_hms_opt(23, 59, 59).unwrap().and_utc()));
        assert!(!range.contains(range.end_exclusive()));
        assert_eq!(range.end_exclusive(), d("2026-04-01").and_time(NaiveTime::MIN).and_utc());
        assert!(DateRange::new(d("2026-04-01"), d("2026-03-01")).is_err());
    }
}

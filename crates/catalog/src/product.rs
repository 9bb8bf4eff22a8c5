use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, Entity, Sku, WarehouseId};

/// Replenishment settings of a shelf-stable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DryGood {
    pub reorder_point: u64,
    pub reorder_quantity: u64,
    pub units_per_case: u64,
}

/// Cold-chain settings of a perishable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fresh {
    /// Storage temperature in degrees Celsius, if the product needs one.
    pub required_temp: Option<Decimal>,
    pub days_to_alert_before_expiry: u32,
}

/// Variant payload. A product is exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductKind {
    DryGood(DryGood),
    Fresh(Fresh),
}

/// Discriminant of [`ProductKind`], used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKindTag {
    DryGood,
    Fresh,
}

impl ProductKind {
    pub fn tag(&self) -> ProductKindTag {
        match self {
            ProductKind::DryGood(_) => ProductKindTag::DryGood,
            ProductKind::Fresh(_) => ProductKindTag::Fresh,
        }
    }

    pub fn as_dry_good(&self) -> Option<&DryGood> {
        match self {
            ProductKind::DryGood(d) => Some(d),
            ProductKind::Fresh(_) => None,
        }
    }

    pub fn as_fresh(&self) -> Option<&Fresh> {
        match self {
            ProductKind::Fresh(f) => Some(f),
            ProductKind::DryGood(_) => None,
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Caller-chosen SKU; `None` lets the catalog assign the next free one.
    pub sku: Option<Sku>,
    pub warehouse_id: WarehouseId,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub purchase_price: Decimal,
    pub weight_per_unit_kg: f64,
    pub volume_per_unit_m3: f64,
    pub initial_quantity: u64,
    pub kind: ProductKind,
}

/// Partial update of descriptive/pricing fields. `None` leaves a field as is.
///
/// Quantity is absent: only stock accounting moves it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub weight_per_unit_kg: Option<f64>,
    pub volume_per_unit_m3: Option<f64>,
    pub warehouse_id: Option<WarehouseId>,
    /// Replacement variant settings; must be the product's current variant.
    pub kind: Option<ProductKind>,
}

/// Product master record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    sku: Sku,
    warehouse_id: WarehouseId,
    name: String,
    brand: String,
    description: String,
    purchase_price: Decimal,
    weight_per_unit_kg: f64,
    volume_per_unit_m3: f64,
    quantity_on_hand: u64,
    kind: ProductKind,
}

impl Product {
    /// Build a validated product under its final SKU.
    pub fn new(sku: Sku, input: NewProduct) -> DomainResult<Self> {
        validate_name(&input.name)?;
        validate_price(input.purchase_price)?;
        validate_measure("weight_per_unit_kg", input.weight_per_unit_kg)?;
        validate_measure("volume_per_unit_m3", input.volume_per_unit_m3)?;

        Ok(Self {
            sku,
            warehouse_id: input.warehouse_id,
            name: input.name.trim().to_string(),
            brand: input.brand.trim().to_string(),
            description: input.description,
            purchase_price: input.purchase_price,
            weight_per_unit_kg: input.weight_per_unit_kg,
            volume_per_unit_m3: input.volume_per_unit_m3,
            quantity_on_hand: input.initial_quantity,
            kind: input.kind,
        })
    }

    pub fn sku(&self) -> Sku {
        self.sku
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.warehouse_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn purchase_price(&self) -> Decimal {
        self.purchase_price
    }

    pub fn weight_per_unit_kg(&self) -> f64 {
        self.weight_per_unit_kg
    }

    pub fn volume_per_unit_m3(&self) -> f64 {
        self.volume_per_unit_m3
    }

    pub fn quantity_on_hand(&self) -> u64 {
        self.quantity_on_hand
    }

    pub fn kind(&self) -> &ProductKind {
        &self.kind
    }

    /// Stock value at purchase price. `Validation` if it exceeds the
    /// decimal range.
    pub fn stock_value(&self) -> DomainResult<Decimal> {
        self.purchase_price
            .checked_mul(Decimal::from(self.quantity_on_hand))
            .ok_or_else(|| {
                DomainError::validation(
                    "stock_value",
                    format!("stock value of sku {} is out of range", self.sku),
                )
            })
    }

    /// Whether a dry good sits at or below `threshold` (its own reorder point
    /// when `None`). Fresh products never count as low stock.
    pub fn is_low_stock(&self, threshold: Option<u64>) -> bool {
        match &self.kind {
            ProductKind::DryGood(d) => {
                self.quantity_on_hand <= threshold.unwrap_or(d.reorder_point)
            }
            ProductKind::Fresh(_) => false,
        }
    }

    /// Validate every field of `update` first, then apply all of them.
    pub fn apply_update(&mut self, update: ProductUpdate) -> DomainResult<()> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(price) = update.purchase_price {
            validate_price(price)?;
        }
        if let Some(w) = update.weight_per_unit_kg {
            validate_measure("weight_per_unit_kg", w)?;
        }
        if let Some(v) = update.volume_per_unit_m3 {
            validate_measure("volume_per_unit_m3", v)?;
        }
        if let Some(kind) = &update.kind {
            if kind.tag() != self.kind.tag() {
                return Err(DomainError::validation(
                    "kind",
                    "a product cannot change between dry good and fresh",
                ));
            }
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(brand) = update.brand {
            self.brand = brand.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.purchase_price {
            self.purchase_price = price;
        }
        if let Some(w) = update.weight_per_unit_kg {
            self.weight_per_unit_kg = w;
        }
        if let Some(v) = update.volume_per_unit_m3 {
            self.volume_per_unit_m3 = v;
        }
        if let Some(warehouse_id) = update.warehouse_id {
            self.warehouse_id = warehouse_id;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        Ok(())
    }

    /// Apply a signed quantity change, returning the new quantity.
    ///
    /// Rejects the change (leaving the product untouched) if stock would go
    /// negative.
    pub fn apply_quantity_delta(&mut self, delta: i64) -> DomainResult<u64> {
        let next = if delta >= 0 {
            self.quantity_on_hand.checked_add(delta.unsigned_abs())
        } else {
            self.quantity_on_hand.checked_sub(delta.unsigned_abs())
        };

        match next {
            Some(q) => {
                self.quantity_on_hand = q;
                Ok(q)
            }
            None if delta < 0 => Err(DomainError::InsufficientStock {
                sku: self.sku,
                on_hand: self.quantity_on_hand,
                requested: delta.unsigned_abs(),
            }),
            None => Err(DomainError::validation(
                "quantity_on_hand",
                "quantity overflow",
            )),
        }
    }
}

impl Entity for Product {
    type Id = Sku;

    fn id(&self) -> Sku {
        self.sku
    }
}

/// Optional scoping for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProductFilter {
    pub warehouse_id: Option<WarehouseId>,
    pub kind: Option<ProductKindTag>,
}

impl ProductFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_warehouse(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id: Some(warehouse_id),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: ProductKindTag) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.warehouse_id.is_none_or(|w| w == product.warehouse_id)
            && self.kind.is_none_or(|k| k == product.kind.tag())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name", "name cannot be empty"));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> DomainResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::validation(
            "purchase_price",
            "purchase price cannot be negative",
        ));
    }
    Ok(())
}

fn validate_measure(field: &'static str, value: f64) -> DomainResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(
            field,
            "must be a finite, non-negative number",
        ));
    }
    Ok(())
}

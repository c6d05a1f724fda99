//! Submission envelope and its code tables.

use serde::{Deserialize, Serialize};

/// Format of the wrapped `product_document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentFormat {
    /// JSON document built by hand.
    Manual,
    /// XML document.
    Xml,
    /// CSV document.
    Csv,
}

/// Operation type requested from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Introduce goods into circulation, JSON payload.
    #[serde(rename = "LP_INTRODUCE_GOODS")]
    LpIntroduceGoods,
    /// Introduce goods into circulation, XML payload.
    #[serde(rename = "LP_INTRODUCE_GOODS_XML")]
    LpIntroduceGoodsXml,
    /// Introduce goods into circulation, CSV payload.
    #[serde(rename = "LP_INTRODUCE_GOODS_CSV")]
    LpIntroduceGoodsCsv,
}

/// Commodity group of the submitted goods.
///
/// Serialized as the upper-case tag name; [`code`](Self::code) gives the
/// registry's numeric code.
///
/// ```rust
/// use crpt_api::ProductGroup;
///
/// assert_eq!(ProductGroup::WithoutGroup.code(), 11);
/// assert_eq!(ProductGroup::from_code(2), Some(ProductGroup::Shoes));
/// assert_eq!(ProductGroup::from_code(12), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductGroup {
    /// Clothes (1).
    Clothes,
    /// Shoes (2).
    Shoes,
    /// Tobacco (3).
    Tobacco,
    /// Perfumery (4).
    Perfumery,
    /// Tires (5).
    Tires,
    /// Electronics (6).
    Electronics,
    /// Pharmaceuticals (7).
    Pharma,
    /// Dairy (8).
    Milk,
    /// Bicycles (9).
    Bicycle,
    /// Wheelchairs (10).
    Wheelchairs,
    /// No commodity group (11).
    WithoutGroup,
}

impl ProductGroup {
    /// All groups in code order.
    pub const ALL: [ProductGroup; 11] = [
        Self::Clothes,
        Self::Shoes,
        Self::Tobacco,
        Self::Perfumery,
        Self::Tires,
        Self::Electronics,
        Self::Pharma,
        Self::Milk,
        Self::Bicycle,
        Self::Wheelchairs,
        Self::WithoutGroup,
    ];

    /// Numeric registry code, 1 through 11.
    pub const fn code(self) -> u8 {
        match self {
            Self::Clothes => 1,
            Self::Shoes => 2,
            Self::Tobacco => 3,
            Self::Perfumery => 4,
            Self::Tires => 5,
            Self::Electronics => 6,
            Self::Pharma => 7,
            Self::Milk => 8,
            Self::Bicycle => 9,
            Self::Wheelchairs => 10,
            Self::WithoutGroup => 11,
        }
    }

    /// Looks a group up by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.code() == code)
    }
}

/// Outer JSON object POSTed to the registry.
///
/// Field order is part of the wire format and follows declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRequest {
    /// Format of `product_document`.
    pub document_format: DocumentFormat,
    /// Base64 of the serialized document.
    pub product_document: String,
    /// Commodity group.
    pub product_group: ProductGroup,
    /// Caller-supplied signature, passed through unchanged.
    pub signature: String,
    /// Requested operation.
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
}

impl BodyRequest {
    /// Envelope used by the public entry point: manual JSON, no group,
    /// goods introduction.
    pub fn introduce_goods(product_document: String, signature: impl Into<String>) -> Self {
        Self {
            document_format: DocumentFormat::Manual,
            product_document,
            product_group: ProductGroup::WithoutGroup,
            signature: signature.into(),
            doc_type: DocumentType::LpIntroduceGoods,
        }
    }
}

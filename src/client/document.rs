//! Document registering goods produced in the Russian Federation.
//!
//! Field names match the upstream JSON schema exactly, including the two
//! camel-case names (`participantInn`, `importRequest`). Every field except
//! `importRequest` is optional; unset fields are sent as JSON `null`, and a
//! product carries either `uit_code` or `uitu_code`, never both.

use serde::{Deserialize, Serialize};

/// Goods introduction document. Serialized, base64-encoded and wrapped into
/// the `product_document` field of the submission envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Participant block.
    pub description: Option<Description>,
    /// Document identifier.
    pub doc_id: Option<String>,
    /// Document status.
    pub doc_status: Option<String>,
    /// Document type tag.
    pub doc_type: Option<String>,
    /// Whether the goods are imported.
    #[serde(rename = "importRequest")]
    pub import_request: bool,
    /// Owner INN.
    pub owner_inn: Option<String>,
    /// Participant INN.
    pub participant_inn: Option<String>,
    /// Producer INN.
    pub producer_inn: Option<String>,
    /// Production date.
    pub production_date: Option<String>,
    /// Production type.
    pub production_type: Option<String>,
    /// Product lines, in submission order.
    pub products: Option<Vec<Product>>,
    /// Registration date.
    pub reg_date: Option<String>,
    /// Registration number.
    pub reg_number: Option<String>,
}

/// Document description block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Participant INN.
    #[serde(rename = "participantInn")]
    pub participant_inn: Option<String>,
}

/// One product line of a [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Certificate document kind.
    pub certificate_document: Option<String>,
    /// Certificate issue date.
    pub certificate_document_date: Option<String>,
    /// Certificate number.
    pub certificate_document_number: Option<String>,
    /// Owner INN.
    pub owner_inn: Option<String>,
    /// Producer INN.
    pub producer_inn: Option<String>,
    /// Production date.
    pub production_date: Option<String>,
    /// TN VED classification code.
    pub tnved_code: Option<String>,
    /// Unit identifier code (UIT).
    pub uit_code: Option<String>,
    /// Transport package identifier code (UITU).
    pub uitu_code: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_document() -> Document {
    let some = |v: &str| Some(v.to_string());
    Document {
        description: Some(Description {
            participant_inn: some("7701234567"),
        }),
        doc_id: some("doc-1"),
        doc_status: some("DRAFT"),
        doc_type: some("LP_INTRODUCE_GOODS"),
        import_request: true,
        owner_inn: some("7701234567"),
        participant_inn: some("7701234567"),
        producer_inn: some("7707654321"),
        production_date: some("2024-01-15"),
        production_type: some("OWN_PRODUCTION"),
        products: Some(vec![Product {
            certificate_document: some("CONFORMITY_CERTIFICATE"),
            certificate_document_date: some("2024-01-10"),
            certificate_document_number: some("RU-123"),
            owner_inn: some("7701234567"),
            producer_inn: some("7707654321"),
            production_date: some("2024-01-15"),
            tnved_code: some("6403"),
            uit_code: some("010461111111111121"),
            uitu_code: None,
        }]),
        reg_date: some("2024-01-16"),
        reg_number: some("R-42"),
    }
}

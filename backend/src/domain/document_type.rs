//! Document types residents can request.
//!
//! Reference data: the portal reads it and never mutates it outside seeding.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum length of a document type name.
pub const DOCUMENT_NAME_MIN: usize = 3;
/// Minimum length of a document type description.
pub const DOCUMENT_DESCRIPTION_MIN: usize = 10;

/// Validation errors for document types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentTypeValidationError {
    /// Identifier was not a UUID.
    InvalidId,
    /// Name shorter than [`DOCUMENT_NAME_MIN`].
    NameTooShort,
    /// Description shorter than [`DOCUMENT_DESCRIPTION_MIN`].
    DescriptionTooShort,
    /// No requirements listed, or one was blank.
    InvalidRequirements,
    /// Fee below zero.
    NegativeFee,
    /// Processing time blank.
    EmptyProcessingTime,
}

impl fmt::Display for DocumentTypeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "document type id must be a valid UUID"),
            Self::NameTooShort => write!(
                f,
                "document name must be at least {DOCUMENT_NAME_MIN} characters"
            ),
            Self::DescriptionTooShort => write!(
                f,
                "description must be at least {DOCUMENT_DESCRIPTION_MIN} characters"
            ),
            Self::InvalidRequirements => {
                write!(f, "at least one non-blank requirement is needed")
            }
            Self::NegativeFee => write!(f, "fee must be non-negative"),
            Self::EmptyProcessingTime => write!(f, "processing time is required"),
        }
    }
}

impl std::error::Error for DocumentTypeValidationError {}

/// Document type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentTypeId(Uuid);

impl DocumentTypeId {
    /// Parse an identifier.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, DocumentTypeValidationError> {
        Uuid::parse_str(raw.as_ref())
            .map(Self)
            .map_err(|_| DocumentTypeValidationError::InvalidId)
    }

    /// Wrap a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DocumentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<DocumentTypeId> for String {
    fn from(value: DocumentTypeId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for DocumentTypeId {
    type Error = DocumentTypeValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Non-negative fee in centavos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fee(u32);

impl Fee {
    /// No charge.
    pub const FREE: Self = Self(0);

    /// Build from a centavo amount.
    pub const fn from_centavos(centavos: u32) -> Self {
        Self(centavos)
    }

    /// Build from whole pesos.
    pub const fn from_pesos(pesos: u32) -> Self {
        Self(pesos.saturating_mul(100))
    }

    /// Validate a signed centavo amount read from storage.
    pub fn try_from_centavos(centavos: i64) -> Result<Self, DocumentTypeValidationError> {
        u32::try_from(centavos)
            .map(Self)
            .map_err(|_| DocumentTypeValidationError::NegativeFee)
    }

    /// Amount in centavos.
    pub const fn centavos(self) -> u32 {
        self.0
    }

    /// Whether the document is issued free of charge.
    pub const fn is_free(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_free() {
            return f.write_str("Free");
        }
        write!(f, "₱{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Raw document type values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTypeDraft {
    /// Identifier.
    pub id: DocumentTypeId,
    /// Display name.
    pub name: String,
    /// Description shown to residents.
    pub description: String,
    /// Ordered list of requirements.
    pub requirements: Vec<String>,
    /// Fee.
    pub fee: Fee,
    /// Free-text processing estimate.
    pub processing_time: String,
    /// Whether new applications may reference it.
    pub is_active: bool,
}

/// Validated document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentType {
    id: DocumentTypeId,
    name: String,
    description: String,
    requirements: Vec<String>,
    fee: Fee,
    processing_time: String,
    is_active: bool,
}

impl TryFrom<DocumentTypeDraft> for DocumentType {
    type Error = DocumentTypeValidationError;

    fn try_from(draft: DocumentTypeDraft) -> Result<Self, Self::Error> {
        let name = draft.name.trim();
        if name.chars().count() < DOCUMENT_NAME_MIN {
            return Err(DocumentTypeValidationError::NameTooShort);
        }
        let description = draft.description.trim();
        if description.chars().count() < DOCUMENT_DESCRIPTION_MIN {
            return Err(DocumentTypeValidationError::DescriptionTooShort);
        }
        if draft.requirements.is_empty()
            || draft.requirements.iter().any(|item| item.trim().is_empty())
        {
            return Err(DocumentTypeValidationError::InvalidRequirements);
        }
        let processing_time = draft.processing_time.trim();
        if processing_time.is_empty() {
            return Err(DocumentTypeValidationError::EmptyProcessingTime);
        }
        Ok(Self {
            id: draft.id,
            name: name.to_owned(),
            description: description.to_owned(),
            requirements: draft
                .requirements
                .iter()
                .map(|item| item.trim().to_owned())
                .collect(),
            fee: draft.fee,
            processing_time: processing_time.to_owned(),
            is_active: draft.is_active,
        })
    }
}

impl DocumentType {
    /// Identifier.
    pub fn id(&self) -> &DocumentTypeId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Description.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Requirements in display order.
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Fee.
    pub fn fee(&self) -> Fee {
        self.fee
    }

    /// Processing estimate.
    pub fn processing_time(&self) -> &str {
        self.processing_time.as_str()
    }

    /// Whether new applications may reference it.
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

struct SeedEntry {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    requirements: &'static [&'static str],
    fee_pesos: u32,
    processing_time: &'static str,
}

const SEED_CATALOGUE: &[SeedEntry] = &[
    SeedEntry {
        id: "6a1f0c3e-0b7d-4a8e-9a51-2d0f7c1b0001",
        name: "Barangay Clearance",
        description: "Certificate of good moral character and residency in the barangay",
        requirements: &["Valid ID", "Proof of Residency", "2x2 ID Picture"],
        fee_pesos: 50,
        processing_time: "1-2 business days",
    },
    SeedEntry {
        id: "6a1f0c3e-0b7d-4a8e-9a51-2d0f7c1b0002",
        name: "Certificate of Indigency",
        description: "Certificate for low-income residents to avail of government assistance",
        requirements: &["Valid ID", "Proof of Income", "Barangay Clearance"],
        fee_pesos: 0,
        processing_time: "2-3 business days",
    },
    SeedEntry {
        id: "6a1f0c3e-0b7d-4a8e-9a51-2d0f7c1b0003",
        name: "Business Permit",
        description: "Permit to operate a business within the barangay",
        requirements: &[
            "DTI Registration",
            "Valid ID",
            "Location Sketch",
            "Barangay Clearance",
        ],
        fee_pesos: 500,
        processing_time: "5-7 business days",
    },
    SeedEntry {
        id: "6a1f0c3e-0b7d-4a8e-9a51-2d0f7c1b0004",
        name: "Certificate of Residency",
        description: "Proof of residence in the barangay",
        requirements: &["Valid ID", "Proof of Address", "2x2 ID Picture"],
        fee_pesos: 30,
        processing_time: "1-2 business days",
    },
    SeedEntry {
        id: "6a1f0c3e-0b7d-4a8e-9a51-2d0f7c1b0005",
        name: "Barangay ID",
        description: "Official identification card issued by the barangay",
        requirements: &["Birth Certificate", "Proof of Residency", "2x2 ID Picture"],
        fee_pesos: 100,
        processing_time: "3-5 business days",
    },
];

/// Default document catalogue seeded into empty stores.
///
/// Identifiers are fixed so re-seeding is idempotent.
///
/// # Examples
/// ```
/// use portal::domain::default_document_types;
///
/// let catalogue = default_document_types();
/// assert_eq!(catalogue.len(), 5);
/// assert_eq!(catalogue[0].name(), "Barangay Clearance");
/// ```
pub fn default_document_types() -> Vec<DocumentType> {
    SEED_CATALOGUE
        .iter()
        .filter_map(|entry| {
            let id = DocumentTypeId::new(entry.id).ok()?;
            DocumentType::try_from(DocumentTypeDraft {
                id,
                name: entry.name.to_owned(),
                description: entry.description.to_owned(),
                requirements: entry
                    .requirements
                    .iter()
                    .map(|item| (*item).to_owned())
                    .collect(),
                fee: Fee::from_pesos(entry.fee_pesos),
                processing_time: entry.processing_time.to_owned(),
                is_active: true,
            })
            .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> DocumentTypeDraft {
        DocumentTypeDraft {
            id: DocumentTypeId::random(),
            name: "Barangay Clearance".to_owned(),
            description: "Proof of good standing".to_owned(),
            requirements: vec!["Valid ID".to_owned()],
            fee: Fee::from_pesos(50),
            processing_time: "1-2 business days".to_owned(),
            is_active: true,
        }
    }

    #[rstest]
    fn seed_catalogue_is_complete() {
        let catalogue = default_document_types();
        assert_eq!(catalogue.len(), SEED_CATALOGUE.len());
        let indigency = catalogue
            .iter()
            .find(|doc| doc.name() == "Certificate of Indigency")
            .expect("indigency seeded");
        assert!(indigency.fee().is_free());
    }

    #[rstest]
    #[case(Fee::FREE, "Free")]
    #[case(Fee::from_pesos(50), "₱50.00")]
    #[case(Fee::from_centavos(12_345), "₱123.45")]
    fn fee_formats_as_pesos(#[case] fee: Fee, #[case] expected: &str) {
        assert_eq!(fee.to_string(), expected);
    }

    #[rstest]
    fn negative_fee_is_rejected() {
        assert_eq!(
            Fee::try_from_centavos(-1),
            Err(DocumentTypeValidationError::NegativeFee)
        );
    }

    #[rstest]
    fn blank_requirement_is_rejected() {
        let mut value = draft();
        value.requirements.push("  ".to_owned());
        assert_eq!(
            DocumentType::try_from(value),
            Err(DocumentTypeValidationError::InvalidRequirements)
        );
    }

    #[rstest]
    fn short_name_is_rejected() {
        let mut value = draft();
        value.name = "ID".to_owned();
        assert_eq!(
            DocumentType::try_from(value),
            Err(DocumentTypeValidationError::NameTooShort)
        );
    }
}

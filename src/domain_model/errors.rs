use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainModelError {
    #[error("Entity '{0}' is already mapped (entity names must be unique)")]
    DuplicateEntity(String),
    #[error("Embeddable '{0}' is already mapped (embeddable names must be unique)")]
    DuplicateEmbeddable(String),
    #[error("Entity '{0}' not found in the domain model")]
    EntityNotFound(String),
    #[error("Embeddable '{0}' not found in the domain model")]
    EmbeddableNotFound(String),
    #[error("Attribute '{attribute}' not found on '{owner}'")]
    AttributeNotFound { owner: String, attribute: String },
    #[error("Association '{owner}.{attribute}' targets unmapped entity '{target}'")]
    UnknownAssociationTarget {
        owner: String,
        attribute: String,
        target: String,
    },
    #[error("Embedded attribute '{owner}.{attribute}' references unmapped embeddable '{embeddable}'")]
    UnknownEmbeddable {
        owner: String,
        attribute: String,
        embeddable: String,
    },
    #[error("Natural-id attribute '{attribute}' does not exist on entity '{entity}'")]
    UnknownNaturalIdAttribute { entity: String, attribute: String },
    #[error("Entity '{0}' declares no attributes (the identifier attribute is required)")]
    EmptyEntity(String),
}

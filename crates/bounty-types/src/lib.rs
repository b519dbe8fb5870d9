pub mod address;
pub mod amount;
pub mod error;
pub mod id;

pub use address::AccountAddress;
pub use amount::TokenAmount;
pub use error::{Result, TypesError};
pub use id::{BountyId, ContentId, SubmissionId};

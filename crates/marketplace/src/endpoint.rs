//! Marketplace endpoints and the fixed identifiers embedded in them.

use serde::{Deserialize, Serialize};

/// Entity type of a supplier offer; appears in every operation path.
pub const ENTITY_TYPE_ID: &str = "8ab79a58-b8d4-494e-a0ec-bbb3b2e781f4";

/// Operation type sent in the start-operation payload.
pub const OPERATION_ID: &str = "aa31f4c6-c31d-4012-ae99-2afeda2e24f7";

/// Every remote call the bid submission can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    CheckAuthentication,
    CompanyLookup,
    NeedLookup,
    CreateEntity,
    StartOperation,
    GetStartedOperation,
    SaveStartedOperation,
    FinishOperation,
}

impl Endpoint {
    /// Returns the endpoint name as used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::CheckAuthentication => "CheckAuthentication",
            Endpoint::CompanyLookup => "GetFullEntity",
            Endpoint::NeedLookup => "NeedGet",
            Endpoint::CreateEntity => "CreateNewOperationEntity",
            Endpoint::StartOperation => "StartOperation",
            Endpoint::GetStartedOperation => "GetStartedOperation",
            Endpoint::SaveStartedOperation => "SaveStartedOperation",
            Endpoint::FinishOperation => "FinishOperation",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

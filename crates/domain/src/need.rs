//! Need inspection: per-item prices and the proposal deadline.

use chrono::FixedOffset;
use marketplace::{MarketplaceClient, NeedId, Transport};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::deadline::MarketTimestamp;
use crate::error::DomainError;

/// What the bid needs to know about the opportunity.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedDetails {
    /// Unit cost of each line item, in listing order.
    pub item_costs: Vec<Decimal>,
    /// When the marketplace stops accepting proposals (marketplace local time).
    pub proposal_end_date: MarketTimestamp,
}

impl NeedDetails {
    /// Cost for the item at `index`, or zero when the need listed fewer items.
    pub fn cost_at(&self, index: usize) -> Decimal {
        self.item_costs.get(index).copied().unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NeedResponse {
    #[serde(default)]
    items: Option<Vec<NeedItem>>,
    #[serde(default)]
    proposal_end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NeedItem {
    #[serde(default)]
    cost_per_unit: Option<Decimal>,
}

/// Fetches the need a bid is placed against.
///
/// The proposal deadline must be pinnable to an instant at `offset`, the
/// marketplace's UTC offset.
pub struct NeedInspector<'a, T: Transport> {
    client: &'a MarketplaceClient<T>,
    offset: FixedOffset,
}

impl<'a, T: Transport> NeedInspector<'a, T> {
    pub fn new(client: &'a MarketplaceClient<T>, offset: FixedOffset) -> Self {
        Self { client, offset }
    }

    /// Fetches item costs and the proposal deadline for a need.
    #[tracing::instrument(skip(self), fields(%need_id))]
    pub async fn fetch(&self, need_id: &NeedId) -> Result<NeedDetails, DomainError> {
        let failure = |reason: String| DomainError::FetchFailure {
            need_id: need_id.to_string(),
            reason,
        };

        let response = self.client.need(need_id).await?;
        if !response.is_ok() {
            return Err(failure(format!(
                "status {}: {}",
                response.status,
                response.body_excerpt()
            )));
        }

        let need: NeedResponse = response.json()?;

        let items = need.items.unwrap_or_default();
        if items.is_empty() {
            return Err(failure("need lists no items".to_string()));
        }
        let item_costs = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.cost_per_unit
                    .ok_or_else(|| failure(format!("item {index} has no costPerUnit")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let raw_deadline = need
            .proposal_end_date
            .ok_or_else(|| failure("need has no proposalEndDate".to_string()))?;
        let proposal_end_date =
            MarketTimestamp::parse(&raw_deadline).map_err(|e| failure(e.to_string()))?;
        if proposal_end_date.at_offset(self.offset).is_none() {
            return Err(failure(format!(
                "proposalEndDate {proposal_end_date} is outside the supported range"
            )));
        }

        tracing::info!(
            items = item_costs.len(),
            costs = ?item_costs,
            %proposal_end_date,
            "need details fetched"
        );

        Ok(NeedDetails {
            item_costs,
            proposal_end_date,
        })
    }
}

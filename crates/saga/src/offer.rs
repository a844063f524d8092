//! The offer payload submitted by the save stage.

use chrono::NaiveDate;
use common::{NeedId, RemoteId};
use domain::{MarketTimestamp, NeedDetails};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Document authorizing the signer to act for the supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerOfAttorney {
    pub name: String,
    pub number: String,
    pub start_date: MarketTimestamp,
}

/// The person legally signing every offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub without_patronymic: bool,
    pub given_name: String,
    pub family_name: String,
    pub patronymic: String,
    pub position: String,
    pub power_of_attorney: PowerOfAttorney,
}

impl Default for Signer {
    fn default() -> Self {
        Self {
            without_patronymic: false,
            given_name: "Иван".to_string(),
            family_name: "Иванов".to_string(),
            patronymic: "Иванович".to_string(),
            position: "Генеральный директор".to_string(),
            power_of_attorney: PowerOfAttorney {
                name: "Устав".to_string(),
                number: "нет".to_string(),
                start_date: MarketTimestamp::from(
                    NaiveDate::from_ymd_opt(2021, 7, 16)
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                        .unwrap_or_default(),
                ),
            },
        }
    }
}

/// Terms the caller sets for an offer, independent of the need.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferTerms {
    /// Tax (VAT) rate identifier applied to every item.
    pub nds_rate_id: i64,
    /// Offer validity end, in marketplace local time.
    pub end_date: MarketTimestamp,
    pub signer: Signer,
}

/// One priced line item of the offer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedItemOffer {
    pub item_id: RemoteId,
    pub need_supplier_id: RemoteId,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_per_unit: Decimal,
    pub amount_with_nds: u32,
    pub nds_rate_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditingEntity {
    pub end_date: MarketTimestamp,
    pub need_id: NeedId,
    pub supplier_id: RemoteId,
    pub need_item_offer: Vec<NeedItemOffer>,
    pub entity_id: RemoteId,
    pub signer: Signer,
}

/// Body of the save-started-operation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOfferRequest {
    pub started_operation_log_id: RemoteId,
    pub editing_entity: EditingEntity,
}

/// Prices each item id with the need's cost at the same position.
///
/// Items beyond the end of the need's cost list are priced at zero.
pub fn price_items(
    item_ids: &[RemoteId],
    need: &NeedDetails,
    entity_id: &RemoteId,
    nds_rate_id: i64,
) -> Vec<NeedItemOffer> {
    item_ids
        .iter()
        .enumerate()
        .map(|(index, item_id)| NeedItemOffer {
            item_id: item_id.clone(),
            need_supplier_id: entity_id.clone(),
            cost_per_unit: need.cost_at(index),
            amount_with_nds: 0,
            nds_rate_id,
        })
        .collect()
}

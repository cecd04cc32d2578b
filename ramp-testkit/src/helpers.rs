//! Fixture builders for orders and analytics records.

use crate::Result;
use ramp_domain::{Amount, BankAccount, NewEvent, NewInstall, NewOrder, WalletAddress};
use rust_decimal::Decimal;

/// A well-formed wallet address
pub const TEST_WALLET: &str = "0x62EC88A97156233cdB416024AC5011C5B9A6f361";

/// Valid deposit submission for `usdt` / `vnd`.
pub fn deposit_submission(usdt: Decimal, vnd: Decimal) -> Result<NewOrder> {
    Ok(NewOrder::deposit(
        WalletAddress::parse(TEST_WALLET)?,
        Amount::new(usdt)?,
        Amount::new(vnd)?,
        format!("FT{}", uuid::Uuid::now_v7().simple()),
    ))
}

/// Valid withdraw submission for `usdt` / `vnd`.
pub fn withdraw_submission(usdt: Decimal, vnd: Decimal) -> Result<NewOrder> {
    Ok(NewOrder::withdraw(
        WalletAddress::parse(TEST_WALLET)?,
        Amount::new(usdt)?,
        Amount::new(vnd)?,
        BankAccount::new("0123456789", "NGUYEN VAN A", "Vietcombank")?,
    ))
}

/// Install attributed to `source` / `campaign`.
pub fn install_from(source: &str, campaign: Option<&str>) -> NewInstall {
    NewInstall {
        utm_source: Some(source.to_string()),
        utm_campaign: campaign.map(str::to_string),
        ..Default::default()
    }
}

/// Event `name` attributed to `source`, performed by `user_id`.
pub fn event_from(name: &str, source: &str, user_id: Option<&str>) -> NewEvent {
    NewEvent {
        utm_source: Some(source.to_string()),
        user_id: user_id.map(str::to_string),
        ..NewEvent::named(name)
    }
}
